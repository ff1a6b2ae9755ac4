//! Click-to-expand panels: component cards and the pros/cons board.

use tracing::debug;

use crate::content::{trade_off, ComponentCard, ComponentId, TradeOff, COMPONENT_CARDS};
use crate::error::{ExplorerError, Result};

/// At most one component card open at a time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CardExplorer {
    open: Option<ComponentId>,
}

impl CardExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_card(&self) -> Option<&'static ComponentCard> {
        let id = self.open?;
        COMPONENT_CARDS.iter().find(|c| c.id == id)
    }

    pub fn is_open(&self, id: ComponentId) -> bool {
        self.open == Some(id)
    }

    /// Clicking the open card closes it; clicking another opens that one instead.
    pub fn toggle(&mut self, id: ComponentId) {
        self.open = if self.open == Some(id) { None } else { Some(id) };
        debug!(?id, open = ?self.open, "card toggled");
    }
}

/// Single selection across both the benefit and challenge lists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TradeOffBoard {
    selected: Option<&'static str>,
}

impl TradeOffBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&'static TradeOff> {
        trade_off(self.selected?)
    }

    pub fn select(&mut self, id: &str) -> Result<()> {
        let item = trade_off(id).ok_or_else(|| {
            ExplorerError::InvalidArgument(format!("unknown trade-off {id:?}"))
        })?;
        self.selected = Some(item.id);
        debug!(id = item.id, side = ?item.side, "trade-off selected");
        Ok(())
    }
}
