use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use ticket_defence_core::{CellCoord, Command, GridDimensions, TowerTypeId};
use ticket_defence_world::{query, World};

const LAYOUT_DOMAIN: &str = "td";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "td:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Towers placed on a map of known dimensions.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TowerLayout {
    /// Number of map rows.
    pub(crate) rows: u32,
    /// Number of map columns.
    pub(crate) columns: u32,
    /// Towers in placement order.
    pub(crate) towers: Vec<LayoutTower>,
}

impl TowerLayout {
    /// Captures the towers currently standing in the world.
    #[must_use]
    pub(crate) fn capture(world: &World) -> Self {
        let dimensions = query::dimensions(world);
        let towers = query::tower_view(world)
            .into_vec()
            .into_iter()
            .map(|tower| LayoutTower {
                kind: tower.kind,
                cell: tower.cell,
                level: tower.level,
                active_skill: tower.active_skill.unwrap_or_default(),
            })
            .collect();
        Self {
            rows: dimensions.rows(),
            columns: dimensions.columns(),
            towers,
        }
    }

    /// Commands rebuilding the layout in a world of matching dimensions.
    pub(crate) fn commands(
        &self,
        dimensions: GridDimensions,
    ) -> Result<Vec<Command>, LayoutTransferError> {
        if dimensions != GridDimensions::new(self.rows, self.columns) {
            return Err(LayoutTransferError::DimensionMismatch {
                layout: (self.rows, self.columns),
                map: (dimensions.rows(), dimensions.columns()),
            });
        }

        let mut commands = Vec::new();
        for tower in &self.towers {
            commands.push(Command::PlaceTower {
                kind: tower.kind.clone(),
                cell: tower.cell,
            });
            for _ in 1..tower.level {
                commands.push(Command::UpgradeTower { cell: tower.cell });
            }
            if tower.active_skill != 0 {
                commands.push(Command::SetActiveSkill {
                    cell: tower.cell,
                    skill: tower.active_skill,
                });
            }
        }
        Ok(commands)
    }

    /// Encodes the layout into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let json = serde_json::to_vec(&self.towers).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{LAYOUT_HEADER}:{}x{}:{encoded}",
            self.rows, self.columns
        ))
    }

    /// Decodes a layout from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (rows, columns) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let towers: Vec<LayoutTower> =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            rows,
            columns,
            towers,
        })
    }
}

/// Tower description captured within a layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutTower {
    /// Type of the tower.
    #[serde(rename = "type")]
    pub(crate) kind: TowerTypeId,
    /// Cell occupied by the tower.
    pub(crate) cell: CellCoord,
    /// Tower level to restore.
    #[serde(default = "first_level")]
    pub(crate) level: u32,
    /// Index of the active skill.
    #[serde(default)]
    pub(crate) active_skill: usize,
}

fn first_level() -> u32 {
    1
}

/// Errors that can occur while transferring layout strings.
#[derive(Debug)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded layout.
    MissingPrefix,
    /// The encoded layout did not contain a version segment.
    MissingVersion,
    /// The encoded layout did not include map dimensions.
    MissingDimensions,
    /// The encoded layout did not include the payload segment.
    MissingPayload,
    /// The encoded layout used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded layout used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The map dimensions could not be parsed from the encoded layout.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
    /// The layout was captured on a map of different size.
    DimensionMismatch {
        /// Rows and columns recorded in the layout.
        layout: (u32, u32),
        /// Rows and columns of the loaded map.
        map: (u32, u32),
    },
}

impl fmt::Display for LayoutTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "layout string was empty"),
            Self::MissingPrefix => write!(f, "layout string is missing the prefix"),
            Self::MissingVersion => write!(f, "layout string is missing the version"),
            Self::MissingDimensions => write!(f, "layout string is missing the map dimensions"),
            Self::MissingPayload => write!(f, "layout string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "layout prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "layout version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse map dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode layout payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not process layout payload: {error}")
            }
            Self::DimensionMismatch { layout, map } => write!(
                f,
                "layout targets a {}x{} map but the loaded map is {}x{}",
                layout.0, layout.1, map.0, map.1
            ),
        }
    }
}

impl Error for LayoutTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (rows, columns) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;

    if rows == 0 || columns == 0 {
        return Err(invalid());
    }

    Ok((rows, columns))
}
