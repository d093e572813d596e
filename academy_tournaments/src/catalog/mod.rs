//! Tournament type catalog.
//!
//! The catalog maps each [`FormatCode`] to an immutable
//! [`TournamentTypeDefinition`]: participant bounds, session timing and the
//! format variant that carries round names, bye policy, points and the
//! tie-break chain.
//!
//! ## Example
//!
//! ```
//! use academy_tournaments::catalog::{FormatCode, TournamentTypeCatalog};
//!
//! let catalog = TournamentTypeCatalog::builtin();
//! let knockout = catalog.get(FormatCode::Knockout).unwrap();
//!
//! assert_eq!(knockout.compute_match_count(8), 7);
//! assert_eq!(knockout.round_label(3, 3), "Final");
//! ```

pub mod formats;
pub mod models;

use std::collections::BTreeMap;

pub use formats::{
    FormatRules, GroupKnockoutFormat, KnockoutFormat, LeagueFormat, SwissFormat,
    TournamentFormat, GROUP_SIZE, GROUP_STAGE_ROUNDS, QUALIFIERS_PER_GROUP,
};
pub use models::{ByePolicy, FormatCode, PointsTable, TiebreakCriterion, TournamentTypeDefinition};

use crate::tournament::{TournamentError, TournamentResult};

const DEFAULT_SESSION_MINUTES: i64 = 90;
const DEFAULT_BREAK_MINUTES: i64 = 15;
const DEFAULT_MAX_PARTICIPANTS: usize = 64;

/// Lookup table of tournament formats
#[derive(Debug, Clone)]
pub struct TournamentTypeCatalog {
    definitions: BTreeMap<FormatCode, TournamentTypeDefinition>,
}

impl TournamentTypeCatalog {
    /// Catalog with the four built-in formats
    pub fn builtin() -> Self {
        Self::with_definitions(vec![
            definition(
                FormatCode::League,
                "League",
                4,
                false,
                LeagueFormat::default().into(),
            ),
            definition(
                FormatCode::Knockout,
                "Knockout",
                4,
                true,
                KnockoutFormat::default().into(),
            ),
            definition(
                FormatCode::GroupKnockout,
                "Group Stage + Knockout",
                2 * GROUP_SIZE,
                false,
                GroupKnockoutFormat::new().into(),
            ),
            definition(
                FormatCode::Swiss,
                "Swiss System",
                4,
                false,
                SwissFormat::default().into(),
            ),
        ])
    }

    /// Catalog built from custom definitions; a later entry replaces an
    /// earlier one with the same code
    pub fn with_definitions(definitions: Vec<TournamentTypeDefinition>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|definition| (definition.code, definition))
                .collect(),
        }
    }

    /// Look up a definition by its stored code string
    ///
    /// # Errors
    ///
    /// * `TournamentError::UnknownFormat` - Code not parseable or not configured
    pub fn lookup(&self, code: &str) -> TournamentResult<&TournamentTypeDefinition> {
        let code: FormatCode = code.parse()?;
        self.get(code)
    }

    pub fn get(&self, code: FormatCode) -> TournamentResult<&TournamentTypeDefinition> {
        self.definitions
            .get(&code)
            .ok_or_else(|| TournamentError::UnknownFormat(code.to_string()))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TournamentTypeDefinition> {
        self.definitions.values()
    }
}

impl Default for TournamentTypeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn definition(
    code: FormatCode,
    display_name: &str,
    min_participants: usize,
    requires_power_of_two: bool,
    format: TournamentFormat,
) -> TournamentTypeDefinition {
    TournamentTypeDefinition {
        code,
        display_name: display_name.to_string(),
        min_participants,
        max_participants: DEFAULT_MAX_PARTICIPANTS,
        requires_power_of_two,
        session_duration_minutes: DEFAULT_SESSION_MINUTES,
        break_between_sessions_minutes: DEFAULT_BREAK_MINUTES,
        format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_all_formats() {
        let catalog = TournamentTypeCatalog::builtin();
        let codes: Vec<_> = catalog.definitions().map(|d| d.code).collect();
        assert_eq!(codes, FormatCode::ALL.to_vec());

        for definition in catalog.definitions() {
            assert_eq!(definition.session_duration_minutes, 90);
            assert_eq!(definition.break_between_sessions_minutes, 15);
        }
    }

    #[test]
    fn test_lookup_unknown_code() {
        let catalog = TournamentTypeCatalog::builtin();
        assert!(catalog.lookup("swiss").is_ok());
        assert!(matches!(
            catalog.lookup("double_elimination"),
            Err(TournamentError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_missing_definition_is_unknown_format() {
        let catalog = TournamentTypeCatalog::with_definitions(Vec::new());
        assert!(matches!(
            catalog.get(FormatCode::League),
            Err(TournamentError::UnknownFormat(code)) if code == "league"
        ));
    }

    #[test]
    fn test_custom_bye_policy_allows_padding() {
        let mut knockout = TournamentTypeCatalog::builtin()
            .get(FormatCode::Knockout)
            .unwrap()
            .clone();
        knockout.format = KnockoutFormat {
            bye_policy: ByePolicy::PadWithByes,
            ..KnockoutFormat::with_third_place_playoff()
        }
        .into();

        let catalog = TournamentTypeCatalog::with_definitions(vec![knockout]);
        let padded = catalog.get(FormatCode::Knockout).unwrap();
        assert!(padded.validate_participant_count(6).is_ok());
        assert_eq!(padded.compute_round_count(6), 3);
        assert_eq!(padded.compute_match_count(6), 6);
    }
}
