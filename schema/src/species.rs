use crate::abilities::AbilityId;
use crate::pokemon_types::PokemonType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    Bulbasaur,
    Charmander,
    Squirtle,
    Pikachu,
    Pidgey,
    Rattata,
    Meowth,
    Onix,
    Gengar,
    Chansey,
    Kangaskhan,
    Magikarp,
    Gyarados,
    Mewtwo,
    Azumarill,
    Ninjask,
    Torkoal,
    Weezing,
    Drifblim,
    Bronzong,
    Staraptor,
    Bisharp,
    Eternatus,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub sp_attack: u8,
    pub sp_defense: u8,
    pub speed: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesData {
    pub species: Species,
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
    /// Base catch difficulty, 1 (hardest) to 255.
    pub catch_rate: u8,
    pub ability: AbilityId,
    /// Species that can never be acquired, whatever the tool.
    #[serde(default = "obtainable_by_default")]
    pub obtainable: bool,
}

fn obtainable_by_default() -> bool {
    true
}
