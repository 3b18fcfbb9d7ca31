//! Host boundary: what the text-input environment provides back to the IME

use serde::{Deserialize, Serialize};

use super::preedit::Preedit;
use super::protocol::ToolKind;

/// A rectangle in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if the host returned bounds no window can be placed against.
    ///
    /// A zero width is fine (a caret is a line); a non-positive height or a
    /// non-finite coordinate is not.
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.height <= 0.0 || self.width < 0.0
    }

    /// Convert between a bottom-left origin and a top-left origin.
    ///
    /// The transform is its own inverse.
    pub fn flip_vertical(&self, screen_height: f64) -> Rect {
        Rect {
            y: screen_height - self.y - self.height,
            ..*self
        }
    }
}

/// Answers geometry queries about the text the user is composing.
///
/// Coordinates are the host's: origin at the bottom-left of the screen.
pub trait AnchorAccessor {
    /// Bounding rectangle of the character at `offset` in the composition
    fn character_rect(&self, offset: usize) -> Option<Rect>;

    /// Height of the screen the client is on, used to flip coordinates
    fn screen_height(&self) -> f64;
}

/// The host text-input environment as seen by the IME.
pub trait HostClient: AnchorAccessor {
    /// Identifier of the application owning the focused text field
    fn client_id(&self) -> &str;

    /// Insert committed text, replacing any inline composition
    fn insert_text(&mut self, text: &str);

    /// Show (or, with an empty preedit, remove) the inline composition
    fn set_marked_text(&mut self, preedit: &Preedit);

    /// Reflect a mode change in the host's input-mode indicator
    fn select_input_mode(&mut self, mode_id: &str);

    /// Open a link in the user's browser
    fn open_link(&mut self, url: &str);

    /// Launch an auxiliary tool. Fire-and-forget.
    fn launch_tool(&mut self, tool: ToolKind);
}
