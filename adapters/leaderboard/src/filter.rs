//! Leaderboard query language.
//!
//! A query is a `;`-separated list of `column:value` clauses, for example
//! `nickname:bo; score:1000-3000`. Numeric columns accept an inclusive range
//! `a-b` or a comparison `<=n`, `>=n`, `<n`, `>n`; any other value is matched
//! as a case-insensitive substring of the column text. Clauses naming unknown
//! columns are skipped. When no clause survives, a non-empty query matches
//! nicknames containing the whole input.

use crate::Player;

/// Column of the leaderboard table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    /// Player nickname.
    Nickname,
    /// Final score.
    Score,
}

struct ColumnDef {
    column: Column,
    name: &'static str,
    text: fn(&Player) -> String,
    number: Option<fn(&Player) -> i64>,
}

static COLUMNS: [ColumnDef; 2] = [
    ColumnDef {
        column: Column::Nickname,
        name: "nickname",
        text: |player| player.nickname.clone(),
        number: None,
    },
    ColumnDef {
        column: Column::Score,
        name: "score",
        text: |player| player.score.to_string(),
        number: Some(|player| i64::try_from(player.score).unwrap_or(i64::MAX)),
    },
];

impl Column {
    /// Every column in display order.
    pub const ALL: [Column; 2] = [Column::Nickname, Column::Score];

    /// Header shown for the column.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// Resolves a lower-case column name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        COLUMNS
            .iter()
            .find(|def| def.name == name)
            .map(|def| def.column)
    }

    /// Text of the column for `player`.
    #[must_use]
    pub fn text(self, player: &Player) -> String {
        (self.def().text)(player)
    }

    fn number(self, player: &Player) -> Option<i64> {
        self.def().number.map(|number| number(player))
    }

    fn is_numeric(self) -> bool {
        self.def().number.is_some()
    }

    fn def(self) -> &'static ColumnDef {
        match self {
            Self::Nickname => &COLUMNS[0],
            Self::Score => &COLUMNS[1],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Comparison {
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
}

impl Comparison {
    const IN_PRIORITY: [(&'static str, Comparison); 4] = [
        ("<=", Comparison::LessEqual),
        (">=", Comparison::GreaterEqual),
        ("<", Comparison::Less),
        (">", Comparison::Greater),
    ];

    fn holds(self, value: i64, bound: i64) -> bool {
        match self {
            Self::LessEqual => value <= bound,
            Self::GreaterEqual => value >= bound,
            Self::Less => value < bound,
            Self::Greater => value > bound,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Clause {
    Contains { column: Column, needle: String },
    Between { column: Column, low: i64, high: i64 },
    Compare { column: Column, op: Comparison, bound: i64 },
}

impl Clause {
    fn parse(part: &str) -> Option<Self> {
        if part.is_empty() || !part.contains(':') {
            return None;
        }
        let mut pieces = part.split(':');
        let column = pieces.next()?.to_lowercase();
        let value = pieces.next()?.to_lowercase();
        let column = column.trim_matches(' ');
        let value = value.trim_matches(' ');
        if column.is_empty() || value.is_empty() {
            return None;
        }
        let column = Column::from_name(column)?;

        if column.is_numeric() {
            if let Some(clause) = Self::range(column, value) {
                return Some(clause);
            }
            for (symbol, op) in Comparison::IN_PRIORITY {
                if !value.contains(symbol) {
                    continue;
                }
                let sides: Vec<&str> = value.split(symbol).collect();
                if let [_, bound] = sides.as_slice() {
                    if let Ok(bound) = bound.trim().parse() {
                        return Some(Self::Compare { column, op, bound });
                    }
                }
            }
        }

        Some(Self::Contains {
            column,
            needle: value.to_owned(),
        })
    }

    fn range(column: Column, value: &str) -> Option<Self> {
        let sides: Vec<&str> = value.split('-').collect();
        let [low, high] = sides.as_slice() else {
            return None;
        };
        Some(Self::Between {
            column,
            low: low.trim().parse().ok()?,
            high: high.trim().parse().ok()?,
        })
    }

    fn matches(&self, player: &Player) -> bool {
        match self {
            Self::Contains { column, needle } => {
                column.text(player).to_lowercase().contains(needle.as_str())
            }
            Self::Between { column, low, high } => column
                .number(player)
                .is_some_and(|value| (*low..=*high).contains(&value)),
            Self::Compare { column, op, bound } => column
                .number(player)
                .is_some_and(|value| op.holds(value, *bound)),
        }
    }
}

/// Parsed leaderboard query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<Clause>,
    fallback: Option<String>,
}

impl Query {
    /// Parses `input`. Parsing never fails; malformed clauses are dropped.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let clauses: Vec<Clause> = input.split(';').filter_map(Clause::parse).collect();
        let fallback = (clauses.is_empty() && !input.is_empty()).then(|| input.to_lowercase());
        Self { clauses, fallback }
    }

    /// Reports whether `player` satisfies every clause.
    #[must_use]
    pub fn matches(&self, player: &Player) -> bool {
        if let Some(needle) = &self.fallback {
            return player.nickname.to_lowercase().contains(needle.as_str());
        }
        self.clauses.iter().all(|clause| clause.matches(player))
    }
}
