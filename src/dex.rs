use crate::errors::DataError;
use schema::{Move, MoveData, Species, SpeciesData};
use std::collections::BTreeMap;
use tracing::debug;

const BUILTIN_MOVES: &str = include_str!("../data/moves.ron");
const BUILTIN_SPECIES: &str = include_str!("../data/species.ron");

/// Static move and species definitions a battle reads from.
///
/// Owned by value and shared behind an `Arc`; there is no global store.
#[derive(Debug, Clone, Default)]
pub struct Dex {
    moves: BTreeMap<Move, MoveData>,
    species: BTreeMap<Species, SpeciesData>,
}

impl Dex {
    /// The tables embedded in the crate.
    pub fn builtin() -> Result<Self, DataError> {
        Self::from_ron(BUILTIN_MOVES, BUILTIN_SPECIES)
    }

    pub fn from_ron(moves: &str, species: &str) -> Result<Self, DataError> {
        let move_list: Vec<MoveData> =
            ron::de::from_str(moves).map_err(|err| DataError::Malformed {
                table: "moves",
                message: err.to_string(),
            })?;
        let species_list: Vec<SpeciesData> =
            ron::de::from_str(species).map_err(|err| DataError::Malformed {
                table: "species",
                message: err.to_string(),
            })?;

        let mut dex = Dex::default();
        for data in move_list {
            if dex.moves.contains_key(&data.id) {
                return Err(DataError::Malformed {
                    table: "moves",
                    message: format!("duplicate entry for {:?}", data.id),
                });
            }
            dex.moves.insert(data.id, data);
        }
        for data in species_list {
            if dex.species.contains_key(&data.species) {
                return Err(DataError::Malformed {
                    table: "species",
                    message: format!("duplicate entry for {:?}", data.species),
                });
            }
            dex.species.insert(data.species, data);
        }

        debug!(
            moves = dex.moves.len(),
            species = dex.species.len(),
            "dex loaded"
        );
        Ok(dex)
    }

    pub fn move_data(&self, move_: Move) -> Result<&MoveData, DataError> {
        self.moves.get(&move_).ok_or(DataError::MoveNotFound(move_))
    }

    pub fn species(&self, species: Species) -> Result<&SpeciesData, DataError> {
        self.species
            .get(&species)
            .ok_or(DataError::SpeciesNotFound(species))
    }

    /// Registers or replaces a move definition.
    pub fn insert_move(&mut self, data: MoveData) {
        self.moves.insert(data.id, data);
    }

    pub fn insert_species(&mut self, data: SpeciesData) {
        self.species.insert(data.species, data);
    }

    pub fn moves(&self) -> impl Iterator<Item = &MoveData> {
        self.moves.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{HitCount, MoveEffect};

    #[test]
    fn test_builtin_tables_parse() {
        let dex = Dex::builtin().unwrap();
        let double_kick = dex.move_data(Move::DoubleKick).unwrap();
        assert_eq!(double_kick.hit_count(), Some(HitCount::Fixed(2)));
        assert_eq!(dex.move_data(Move::QuickAttack).unwrap().priority, 1);
        assert!(dex.species(Species::Pikachu).unwrap().obtainable);
        assert!(!dex.species(Species::Eternatus).unwrap().obtainable);
        assert_eq!(
            dex.move_data(Move::FutureSight).unwrap().effects,
            vec![MoveEffect::DelayedAttack { turns: 3 }]
        );
    }

    #[test]
    fn test_duplicate_entries_rejected() {
        let moves = r#"[
            (id: Tackle, name: "Tackle", move_type: Normal, category: Physical, power: Some(40), accuracy: Some(100), max_pp: 35, target: SingleOpponent),
            (id: Tackle, name: "Tackle", move_type: Normal, category: Physical, power: Some(40), accuracy: Some(100), max_pp: 35, target: SingleOpponent),
        ]"#;
        let err = Dex::from_ron(moves, "[]").unwrap_err();
        assert!(matches!(err, DataError::Malformed { table: "moves", .. }));
    }

    #[test]
    fn test_missing_lookup_is_an_error() {
        let dex = Dex::from_ron("[]", "[]").unwrap();
        assert_eq!(
            dex.move_data(Move::Tackle).unwrap_err(),
            DataError::MoveNotFound(Move::Tackle)
        );
    }
}
