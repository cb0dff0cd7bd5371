// Presentation derivation: which players to show, in what order.
//
// Everything here is a pure function of (roster, available pool, local
// filter). Nothing is cached and no input is mutated; the app loop
// recomputes the view after every applied event.

use std::collections::HashSet;

use serde::Serialize;

use crate::protocol::Player;

/// Which availability subset to show, chosen before any other filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Available,
    Taken,
    All,
}

/// Field a view can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Sorts by last name, like the roster listing.
    Name,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Local-only presentation preferences. Never sent to the authority.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewFilter {
    /// Free-text query matched case-insensitively against the display
    /// name. Empty matches everything.
    pub query: String,
    /// Category codes to keep. Empty means no category filtering.
    pub categories: Vec<String>,
    pub scope: Scope,
    /// Absent means roster natural order.
    pub sort: Option<SortSpec>,
}

impl ViewFilter {
    /// Cycle a column's sort: unsorted -> ascending -> descending -> unsorted.
    /// Switching to a different field starts over at ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort = match self.sort {
            Some(spec) if spec.field == field => match spec.direction {
                SortDirection::Ascending => Some(SortSpec {
                    field,
                    direction: SortDirection::Descending,
                }),
                SortDirection::Descending => None,
            },
            _ => Some(SortSpec {
                field,
                direction: SortDirection::Ascending,
            }),
        };
    }

    /// Add or remove one category code from the filter set.
    pub fn toggle_category(&mut self, code: &str) {
        if let Some(pos) = self.categories.iter().position(|c| c == code) {
            self.categories.remove(pos);
        } else {
            self.categories.push(code.to_string());
        }
    }
}

/// Ids of players already selected: the roster minus the available pool.
///
/// The single complement helper shared by scope selection and per-row
/// taken marking. An absent pool means no authoritative draft data yet,
/// so nothing counts as taken.
pub fn taken_ids(roster: &[Player], pool: Option<&HashSet<i64>>) -> HashSet<i64> {
    match pool {
        None => HashSet::new(),
        Some(pool) => roster
            .iter()
            .map(|p| p.id)
            .filter(|id| !pool.contains(id))
            .collect(),
    }
}

/// Compute the exact ordered list of players to present.
///
/// Applies, in order: availability scope, free-text query, category
/// filter, then an optional stable sort on a copy. Without a sort the
/// roster's natural order is preserved. Pure: identical inputs produce
/// identical output and no input is mutated.
pub fn derive<'a>(
    roster: &'a [Player],
    pool: Option<&HashSet<i64>>,
    filter: &ViewFilter,
) -> Vec<&'a Player> {
    let taken = taken_ids(roster, pool);

    let mut players: Vec<&Player> = roster
        .iter()
        .filter(|p| match filter.scope {
            Scope::All => true,
            Scope::Available => !taken.contains(&p.id),
            Scope::Taken => taken.contains(&p.id),
        })
        .collect();

    if !filter.query.is_empty() {
        let query = filter.query.to_lowercase();
        players.retain(|p| p.display_name().to_lowercase().contains(&query));
    }

    if !filter.categories.is_empty() {
        players.retain(|p| filter.categories.iter().any(|c| *c == p.category_code));
    }

    if let Some(spec) = &filter.sort {
        // Vec::sort_by is stable, so equal keys keep the order they had
        // after filtering.
        players.sort_by(|a, b| {
            let ordering = match spec.field {
                SortField::Name => a.last_name.cmp(&b.last_name),
                SortField::Category => a.category_code.cmp(&b.category_code),
            };
            match spec.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }

    players
}
