//! Print job persisted as `print.json`.
//!
//! The document maps cropped filenames to print quantities and carries the
//! page settings. Loading is lenient per field: unknown fields are ignored,
//! missing or unreadable fields take their defaults with a warning, numbers
//! are rounded into range and negative quantities clamp to zero. Saving is
//! atomic.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::write_file_atomically;
use crate::error::{ProxyError, Result};
use crate::layout::{Orientation, PageSize};
use crate::units::{cap_bleed_edge, is_number_string, BleedEdge};

/// Output name used when the configured one is empty.
pub const DEFAULT_FILENAME: &str = "_printme";

/// Names at least this long are abbreviated for display.
const TITLE_ABBREVIATE_AT: usize = 35;
const TITLE_HEAD_CHARS: usize = 28;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    /// Cropped filename → copies to print.
    #[serde(deserialize_with = "lenient_quantities")]
    pub cards: BTreeMap<String, u32>,
    /// Host window size, kept for front ends that restore it.
    #[serde(deserialize_with = "lenient_size")]
    pub size: (u32, u32),
    /// Preview grid columns.
    #[serde(deserialize_with = "lenient_columns")]
    pub columns: u32,
    #[serde(deserialize_with = "lenient_page_size")]
    pub pagesize: PageSize,
    #[serde(deserialize_with = "lenient_page_sizes")]
    pub page_sizes: Vec<PageSize>,
    #[serde(deserialize_with = "lenient_orientation")]
    pub orient: Orientation,
    /// Bleed margin in millimeters, as entered.
    #[serde(deserialize_with = "lenient_bleed_edge")]
    pub bleed_edge: String,
    /// Output PDF name without extension.
    #[serde(deserialize_with = "lenient_filename")]
    pub filename: String,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            cards: BTreeMap::new(),
            size: (1480, 920),
            columns: 5,
            pagesize: PageSize::Letter,
            page_sizes: PageSize::ALL.to_vec(),
            orient: Orientation::Portrait,
            bleed_edge: "0".to_string(),
            filename: DEFAULT_FILENAME.to_string(),
        }
    }
}

// ============================================================================
// Lenient field loading
// ============================================================================
//
// Each field is read as a raw JSON value and coerced on its own, so one bad
// entry costs that field its default instead of rejecting the whole project.

type FieldResult<T, E> = std::result::Result<T, E>;

fn fallback<T: fmt::Debug>(field: &str, value: &Value, default: T) -> T {
    warn!("ignoring {field} {value}, using {default:?}");
    default
}

/// Round a JSON number into `u32`, clamping negatives to zero.
fn coerce_u32(value: &Value) -> Option<u32> {
    let n = value.as_f64()?;
    Some(n.round().clamp(0.0, f64::from(u32::MAX)) as u32)
}

fn lenient_quantities<'de, D>(deserializer: D) -> FieldResult<BTreeMap<String, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(raw) = Value::deserialize(deserializer)? else {
        warn!("ignoring cards, expected an object");
        return Ok(BTreeMap::new());
    };
    Ok(raw
        .into_iter()
        .filter_map(|(name, qty)| match coerce_u32(&qty) {
            Some(qty) => Some((name, qty)),
            None => {
                warn!("ignoring quantity {qty} for {name}");
                None
            }
        })
        .collect())
}

fn lenient_size<'de, D>(deserializer: D) -> FieldResult<(u32, u32), D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Value::Array(items) = &value {
        if let [w, h] = items.as_slice() {
            if let (Some(w), Some(h)) = (coerce_u32(w), coerce_u32(h)) {
                return Ok((w, h));
            }
        }
    }
    Ok(fallback("size", &value, Project::default().size))
}

fn lenient_columns<'de, D>(deserializer: D) -> FieldResult<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match coerce_u32(&value) {
        Some(columns) => Ok(columns),
        None => Ok(fallback("columns", &value, Project::default().columns)),
    }
}

fn parse_named<T: std::str::FromStr>(value: &Value) -> Option<T> {
    value.as_str().and_then(|s| s.parse().ok())
}

fn lenient_page_size<'de, D>(deserializer: D) -> FieldResult<PageSize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_named(&value).unwrap_or_else(|| fallback("pagesize", &value, PageSize::Letter)))
}

fn lenient_page_sizes<'de, D>(deserializer: D) -> FieldResult<Vec<PageSize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = &value else {
        return Ok(fallback("page_sizes", &value, PageSize::ALL.to_vec()));
    };
    Ok(items
        .iter()
        .filter_map(|item| {
            let size = parse_named(item);
            if size.is_none() {
                warn!("ignoring page size {item}");
            }
            size
        })
        .collect())
}

fn lenient_orientation<'de, D>(deserializer: D) -> FieldResult<Orientation, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_named(&value).unwrap_or_else(|| fallback("orient", &value, Orientation::Portrait)))
}

fn lenient_bleed_edge<'de, D>(deserializer: D) -> FieldResult<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => fallback("bleed_edge", &other, "0".to_string()),
    })
}

fn lenient_filename<'de, D>(deserializer: D) -> FieldResult<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        other => fallback("filename", &other, DEFAULT_FILENAME.to_string()),
    })
}

impl Project {
    /// Load `path`, or start from defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no project at {}, starting fresh", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let mut project: Project = serde_json::from_str(&text)
            .map_err(|e| ProxyError::persistence(path, format!("corrupt project: {e}")))?;
        project.sanitize();
        Ok(project)
    }

    /// Write atomically as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ProxyError::persistence(path, e))?;
        write_file_atomically(path, json.as_bytes())
    }

    fn sanitize(&mut self) {
        let capped = cap_bleed_edge(self.bleed_edge.trim());
        if is_number_string(&capped) {
            self.bleed_edge = capped;
        } else {
            warn!("ignoring invalid bleed edge {:?}", self.bleed_edge);
            self.bleed_edge = "0".to_string();
        }
        self.columns = self.columns.max(1);
        if self.page_sizes.is_empty() {
            self.page_sizes = PageSize::ALL.to_vec();
        }
    }

    /// Validated bleed margin.
    pub fn bleed(&self) -> BleedEdge {
        BleedEdge::parse(&self.bleed_edge).unwrap_or(BleedEdge::NONE)
    }

    /// Validate, cap and store a user-entered bleed edge.
    pub fn set_bleed_edge(&mut self, text: &str) -> Result<BleedEdge> {
        let bleed = BleedEdge::parse(text)?;
        self.bleed_edge = cap_bleed_edge(text.trim());
        Ok(bleed)
    }

    /// Match the card list to the cropped files that exist.
    ///
    /// New names start at quantity 1; names without a file are dropped.
    /// Returns `(added, removed)`.
    pub fn reconcile<I, S>(&mut self, names: I) -> (usize, usize)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let present: BTreeMap<String, ()> = names.into_iter().map(|n| (n.into(), ())).collect();

        let before = self.cards.len();
        self.cards.retain(|name, _| present.contains_key(name));
        let removed = before - self.cards.len();

        let mut added = 0;
        for name in present.into_keys() {
            self.cards.entry(name).or_insert_with(|| {
                added += 1;
                1
            });
        }
        (added, removed)
    }

    fn quantity_mut(&mut self, name: &str) -> Result<&mut u32> {
        self.cards
            .get_mut(name)
            .ok_or_else(|| ProxyError::InvalidValue {
                field: "card",
                value: name.to_string(),
            })
    }

    /// Add one copy; returns the new quantity.
    pub fn increment(&mut self, name: &str) -> Result<u32> {
        let qty = self.quantity_mut(name)?;
        *qty = qty.saturating_add(1);
        Ok(*qty)
    }

    /// Remove one copy, stopping at zero; returns the new quantity.
    pub fn decrement(&mut self, name: &str) -> Result<u32> {
        let qty = self.quantity_mut(name)?;
        *qty = qty.saturating_sub(1);
        Ok(*qty)
    }

    pub fn set_quantity(&mut self, name: &str, quantity: u32) -> Result<()> {
        *self.quantity_mut(name)? = quantity;
        Ok(())
    }

    /// Copies across every card.
    pub fn total_cards(&self) -> u64 {
        self.cards.values().map(|&q| u64::from(q)).sum()
    }

    /// PDF path under `root`, with non-word characters removed from the name.
    pub fn output_path(&self, root: &Path) -> PathBuf {
        let stem: String = self
            .filename
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let stem = if stem.is_empty() {
            DEFAULT_FILENAME
        } else {
            stem.as_str()
        };
        root.join(format!("{stem}.pdf"))
    }
}

/// Short label for a card name.
///
/// Names of 35 characters or more keep their first 28 characters and the
/// tail from one character before the extension dot.
pub fn display_title(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() < TITLE_ABBREVIATE_AT {
        return name.to_string();
    }
    let tail_start = match chars.iter().rposition(|&c| c == '.') {
        Some(dot) => dot.saturating_sub(1),
        None => chars.len() - 2,
    };
    let head: String = chars[..TITLE_HEAD_CHARS].iter().collect();
    let tail: String = chars[tail_start..].iter().collect();
    format!("{head}...{tail}")
}
