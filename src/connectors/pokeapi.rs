//! PokeAPI Connector - Pokémon data with derived type matchups and
//! evolution chains.
//!
//! Responses are cached per request path for the life of the connector.
//! PokeAPI data is static, so there is no eviction.

use super::http::{path_segment, ApiClient, Auth};
use super::tool::{ensure_not_blank, render_json, Tool, ToolInput};
use super::Connector;
use crate::context::{ConnectorDescriptor, ExecutionContext, SetupField};
use crate::errors::{ConnectorError, ConnectorResult, McpResult};
use dashmap::DashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const KEY: &str = "pokeapi";
const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

pub const ALL_TYPES: [&str; 18] = [
    "normal", "fire", "water", "electric", "grass", "ice", "fighting", "poison", "ground",
    "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

pub fn descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::new("PokeAPI", KEY, "1.0.0")
        .logo("https://pokeapi.co/static/pokeapi_256.3fa72200.png")
        .example_prompt("What is Gyarados weak to, and how does Magikarp evolve?")
        .setup(SetupField::string("base_url", "PokeAPI base URL").default_value(DEFAULT_BASE_URL))
}

pub fn connector() -> McpResult<Connector> {
    let cache = Arc::new(ResponseCache::default());

    let pokemon_cache = cache.clone();
    let types_cache = cache.clone();
    let evolution_cache = cache;

    Connector::builder(descriptor())
        .tool(Tool::new(
            "get_pokemon",
            "Get a Pokémon's types, abilities and base stats",
            move |input: PokemonInput, ctx| get_pokemon(pokemon_cache.clone(), input, ctx),
        ))
        .tool(Tool::new(
            "type_effectiveness",
            "Compute damage multipliers against a Pokémon or a type combination",
            move |input: TypeEffectivenessInput, ctx| type_effectiveness(types_cache.clone(), input, ctx),
        ))
        .tool(Tool::new(
            "evolution_chain",
            "Walk the evolution chain of a Pokémon species",
            move |input: PokemonInput, ctx| evolution_chain(evolution_cache.clone(), input, ctx),
        ))
        .build()
}

/// Successful responses keyed by request path.
#[derive(Default)]
pub struct ResponseCache {
    entries: DashMap<String, Value>,
}

impl ResponseCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn get_json(&self, api: &ApiClient, operation: &str, path: &str) -> ConnectorResult<Value> {
        if let Some(hit) = self.entries.get(path) {
            debug!(path = %path, "PokeAPI cache hit");
            return Ok(hit.clone());
        }

        let value = api.get_json(operation, path, &[]).await?;
        self.entries.insert(path.to_string(), value.clone());
        Ok(value)
    }
}

async fn api(context: &dyn ExecutionContext) -> ConnectorResult<ApiClient> {
    let setup = context.get_setup().await?;
    let base_url = setup.str("base_url").unwrap_or(DEFAULT_BASE_URL);
    ApiClient::connect(context, KEY, base_url, Auth::None)
}

fn resource_name(name: &str) -> String {
    path_segment(&name.trim().to_lowercase().replace(' ', "-"))
}

fn names(list: &Value, pointer: &str) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.pointer(pointer).and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PokemonInput {
    /// Pokémon name or national dex number (e.g. pikachu, 25)
    pub name: String,
}

impl ToolInput for PokemonInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("name", &self.name)
    }
}

async fn get_pokemon(
    cache: Arc<ResponseCache>,
    input: PokemonInput,
    ctx: Arc<dyn ExecutionContext>,
) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    let path = format!("pokemon/{}", resource_name(&input.name));
    let pokemon = cache.get_json(&api, "get pokemon", &path).await?;

    let stats: BTreeMap<String, u64> = pokemon["stats"]
        .as_array()
        .map(|stats| {
            stats
                .iter()
                .filter_map(|s| Some((s.pointer("/stat/name")?.as_str()?.to_string(), s["base_stat"].as_u64()?)))
                .collect()
        })
        .unwrap_or_default();

    let abilities: Vec<Value> = pokemon["abilities"]
        .as_array()
        .map(|abilities| {
            abilities
                .iter()
                .map(|a| json!({ "name": a.pointer("/ability/name"), "hidden": a["is_hidden"] }))
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({
        "id": pokemon["id"],
        "name": pokemon["name"],
        "height_dm": pokemon["height"],
        "weight_hg": pokemon["weight"],
        "types": names(&pokemon["types"], "/type/name"),
        "abilities": abilities,
        "base_stats": stats,
        "base_stat_total": stats.values().sum::<u64>(),
    }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TypeEffectivenessInput {
    /// Pokémon whose types are used as the defending types
    pub pokemon: Option<String>,
    /// Defending types (one or two), used when no Pokémon is given
    pub types: Option<Vec<String>>,
}

impl ToolInput for TypeEffectivenessInput {
    fn validate(&self) -> Result<(), String> {
        match (&self.pokemon, &self.types) {
            (Some(_), Some(_)) | (None, None) => Err("provide exactly one of pokemon or types".to_string()),
            (None, Some(types)) if types.is_empty() || types.len() > 2 => {
                Err("types must contain one or two entries".to_string())
            }
            (None, Some(types)) => {
                if let Some(unknown) = types.iter().find(|t| !ALL_TYPES.contains(&t.to_lowercase().as_str())) {
                    return Err(format!("unknown type '{}'", unknown));
                }
                if types.len() == 2 && types[0].eq_ignore_ascii_case(&types[1]) {
                    return Err(format!("type '{}' is listed twice", types[1]));
                }
                Ok(())
            }
            (Some(name), None) => ensure_not_blank("pokemon", name),
        }
    }
}

/// Damage relations of one defending type.
#[derive(Debug, Default, Clone)]
pub struct DamageRelations {
    pub double_from: Vec<String>,
    pub half_from: Vec<String>,
    pub none_from: Vec<String>,
}

impl DamageRelations {
    fn from_type(body: &Value) -> Self {
        let relations = &body["damage_relations"];
        Self {
            double_from: names(&relations["double_damage_from"], "/name"),
            half_from: names(&relations["half_damage_from"], "/name"),
            none_from: names(&relations["no_damage_from"], "/name"),
        }
    }

    fn factor(&self, attacking: &str) -> f64 {
        if self.none_from.iter().any(|t| t == attacking) {
            0.0
        } else if self.double_from.iter().any(|t| t == attacking) {
            2.0
        } else if self.half_from.iter().any(|t| t == attacking) {
            0.5
        } else {
            1.0
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Matchups {
    pub weaknesses: BTreeMap<String, f64>,
    pub resistances: BTreeMap<String, f64>,
    pub immunities: Vec<String>,
    pub neutral: Vec<String>,
}

/// Multiply per-type factors for every attacking type.
pub fn matchups(defending: &[DamageRelations]) -> Matchups {
    let mut result = Matchups {
        weaknesses: BTreeMap::new(),
        resistances: BTreeMap::new(),
        immunities: Vec::new(),
        neutral: Vec::new(),
    };

    for attacking in ALL_TYPES {
        let multiplier: f64 = defending.iter().map(|d| d.factor(attacking)).product();

        if multiplier == 0.0 {
            result.immunities.push(attacking.to_string());
        } else if multiplier > 1.0 {
            result.weaknesses.insert(attacking.to_string(), multiplier);
        } else if multiplier < 1.0 {
            result.resistances.insert(attacking.to_string(), multiplier);
        } else {
            result.neutral.push(attacking.to_string());
        }
    }

    result
}

async fn type_effectiveness(
    cache: Arc<ResponseCache>,
    input: TypeEffectivenessInput,
    ctx: Arc<dyn ExecutionContext>,
) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;

    let defending: Vec<String> = match (&input.pokemon, input.types) {
        (Some(name), _) => {
            let path = format!("pokemon/{}", resource_name(name));
            let pokemon = cache.get_json(&api, "get pokemon", &path).await?;
            names(&pokemon["types"], "/type/name")
        }
        (None, Some(types)) => types.iter().map(|t| t.to_lowercase()).collect(),
        (None, None) => Vec::new(),
    };

    if defending.is_empty() {
        return Err(ConnectorError::parse("no defending types found").with_operation("resolve defending types"));
    }

    let mut relations = Vec::with_capacity(defending.len());
    for type_name in &defending {
        let path = format!("type/{}", path_segment(type_name));
        let body = cache.get_json(&api, "get type", &path).await?;
        relations.push(DamageRelations::from_type(&body));
    }

    render_json(&json!({
        "pokemon": input.pokemon,
        "defending_types": defending,
        "matchups": matchups(&relations),
    }))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EvolutionStage {
    pub name: String,
    pub depth: usize,
    pub evolves_from: Option<String>,
    pub trigger: Option<String>,
    pub min_level: Option<u64>,
    pub item: Option<String>,
}

/// Depth-first walk returning every stage and every root-to-leaf path.
pub fn walk_chain(root: &Value) -> (Vec<EvolutionStage>, Vec<Vec<String>>) {
    fn visit(
        node: &Value,
        depth: usize,
        parent: Option<&str>,
        trail: &mut Vec<String>,
        stages: &mut Vec<EvolutionStage>,
        paths: &mut Vec<Vec<String>>,
    ) {
        let name = node.pointer("/species/name").and_then(Value::as_str).unwrap_or("unknown");
        let details = node["evolution_details"].get(0);

        stages.push(EvolutionStage {
            name: name.to_string(),
            depth,
            evolves_from: parent.map(String::from),
            trigger: details
                .and_then(|d| d.pointer("/trigger/name"))
                .and_then(Value::as_str)
                .map(String::from),
            min_level: details.and_then(|d| d["min_level"].as_u64()),
            item: details
                .and_then(|d| d.pointer("/item/name"))
                .and_then(Value::as_str)
                .map(String::from),
        });

        trail.push(name.to_string());
        let children = node["evolves_to"].as_array().map(Vec::as_slice).unwrap_or_default();
        if children.is_empty() {
            paths.push(trail.clone());
        }
        for child in children {
            visit(child, depth + 1, Some(name), trail, stages, paths);
        }
        trail.pop();
    }

    let mut stages = Vec::new();
    let mut paths = Vec::new();
    visit(root, 0, None, &mut Vec::new(), &mut stages, &mut paths);
    (stages, paths)
}

async fn evolution_chain(
    cache: Arc<ResponseCache>,
    input: PokemonInput,
    ctx: Arc<dyn ExecutionContext>,
) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;

    let species_path = format!("pokemon-species/{}", resource_name(&input.name));
    let species = cache.get_json(&api, "get species", &species_path).await?;

    // Species responses carry an absolute URL; keep only the path so the
    // cache key and base URL stay consistent.
    let chain_url = species
        .pointer("/evolution_chain/url")
        .and_then(Value::as_str)
        .ok_or_else(|| ConnectorError::parse("species has no evolution chain").with_operation("get species"))?;
    let chain_path = chain_url
        .find("evolution-chain/")
        .map(|idx| chain_url[idx..].to_string())
        .ok_or_else(|| {
            ConnectorError::parse(format!("unexpected evolution chain URL: {}", chain_url))
                .with_operation("get species")
        })?;

    let chain = cache.get_json(&api, "get evolution chain", &chain_path).await?;
    let (stages, paths) = walk_chain(&chain["chain"]);

    render_json(&json!({
        "species": species["name"],
        "chain_id": chain["id"],
        "stages": stages,
        "paths": paths,
    }))
}
