use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reason_id::ReasonId;

/// Separator between names in the canonical factor key.
const FACTOR_KEY_SEPARATOR: char = '\u{1f}';
/// Separator between the target and the factor key in a record digest.
const RECORD_ID_SEPARATOR: char = '\u{1e}';

/// Escapes `\` and both separators so that joined keys stay unambiguous
/// whatever text an id carries.
fn escape_key_part(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            FACTOR_KEY_SEPARATOR => out.push_str("\\f"),
            RECORD_ID_SEPARATOR => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Whether a reason argues for or against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Support,
    Oppose,
}

impl Polarity {
    /// Votes at or above one half support; below oppose.
    pub fn from_vote(vote: f64) -> Self {
        if vote >= 0.5 {
            Self::Support
        } else {
            Self::Oppose
        }
    }

    /// +1 for support, -1 for opposition.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Support => 1.0,
            Self::Oppose => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Oppose => "oppose",
        }
    }

    pub fn from_str_name(name: &str) -> Option<Self> {
        match name {
            "support" => Some(Self::Support),
            "oppose" => Some(Self::Oppose),
            _ => None,
        }
    }
}

/// A persisted reason: a conjunction of `factors` justifying `target`.
///
/// When no conjunction is involved the record has a single factor.
/// Records are keyed by (target, factor set); the factor order is kept as
/// given but does not affect identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonRecord {
    /// Deterministic id derived from (target, factor set).
    pub id: String,
    /// What this is a reason for.
    pub target: ReasonId,
    /// What must all hold for this reason to hold.
    pub factors: Vec<ReasonId>,
    /// According to these factors, how reliable is the target (1 support, 0 oppose).
    pub vote: f64,
    /// How much this conjunction of factors is believed.
    pub weight: f64,
    pub polarity: Polarity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReasonRecord {
    /// Build a fresh, not-yet-persisted record.
    pub fn new(target: ReasonId, factors: Vec<ReasonId>, vote: f64, weight: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Self::record_id(&target, &factors),
            target,
            factors,
            vote,
            weight,
            polarity: Polarity::from_vote(vote),
            created_at: now,
            updated_at: now,
        }
    }

    /// Order-independent canonical form of a factor set.
    pub fn factor_key(factors: &[ReasonId]) -> String {
        let mut names: Vec<String> = factors
            .iter()
            .map(|f| escape_key_part(&f.to_string()))
            .collect();
        names.sort();
        names.dedup();
        names.join(&FACTOR_KEY_SEPARATOR.to_string())
    }

    /// Stable record id: a blake3 digest of the upsert key.
    pub fn record_id(target: &ReasonId, factors: &[ReasonId]) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(escape_key_part(&target.to_string()).as_bytes());
        hasher.update(RECORD_ID_SEPARATOR.to_string().as_bytes());
        hasher.update(Self::factor_key(factors).as_bytes());
        hasher.finalize().to_hex()[..24].to_string()
    }

    /// This record's own canonical factor key.
    pub fn key(&self) -> String {
        Self::factor_key(&self.factors)
    }

    /// Node id used when the record is materialised in a graph.
    pub fn node_id(&self) -> ReasonId {
        ReasonId::conjunction(self.id.clone())
    }

    /// Edge weight as seen by propagation: negative for opposition.
    pub fn signed_weight(&self) -> f64 {
        self.weight * self.polarity.sign()
    }

    /// Whether the target appears among its own factors.
    pub fn is_self_supporting(&self) -> bool {
        self.factors.contains(&self.target)
    }
}
