//! Configuration validation with helpful error messages

use anyhow::Result;

use super::{GemfamilyConfig, GraphConfig};
use crate::dependency::GraphStyle;
use crate::error::GemError;

const RANK_DIRECTIONS: &[&str] = &["TB", "LR", "BT", "RL"];

/// Validate the entire gemfamily configuration
pub fn validate_config(config: &GemfamilyConfig) -> Result<()> {
    validate_graph(&config.graph)?;
    validate_style(&config.graph.style)?;
    Ok(())
}

fn validate_graph(graph: &GraphConfig) -> Result<()> {
    if graph.title.trim().is_empty() {
        return Err(GemError::config_error_with_hint(
            "[graph] title cannot be empty",
            "Set a title such as title = \"GemFamily\", or remove the key to use the default",
        )
        .into());
    }

    if graph.virtual_title.trim().is_empty() {
        return Err(GemError::config_error_with_hint(
            "[graph] virtual_title cannot be empty",
            "Set a label such as virtual_title = \"Root\", or remove the key to use the default",
        )
        .into());
    }

    Ok(())
}

fn validate_style(style: &GraphStyle) -> Result<()> {
    if style.edge_font_size == 0 {
        return Err(GemError::config_error_with_hint(
            "[graph.style] edge_font_size must be greater than zero",
            "Graphviz font sizes are in points; the default is 10",
        )
        .into());
    }

    if !RANK_DIRECTIONS.contains(&style.rankdir.as_str()) {
        return Err(GemError::config_error_with_hint(
            format!("[graph.style] invalid rankdir '{}'", style.rankdir),
            format!("Use one of: {}", RANK_DIRECTIONS.join(", ")),
        )
        .into());
    }

    if !style.label_distance.is_finite() || !style.label_angle.is_finite() {
        return Err(GemError::config_error(
            "[graph.style] label_distance and label_angle must be finite numbers",
        )
        .into());
    }

    Ok(())
}
