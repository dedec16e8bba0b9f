//! Chat transcript and inline chart injection.
//!
//! Assistant answers may contain [`WIDGET_MARKER`]. Each occurrence becomes an
//! empty [`Placeholder`] in the transcript; [`ChatWidgetInjector`] later mounts
//! charts into them. Inline charts are not favorites: they never touch the
//! registry or the creation queue and nothing tears them down individually.

use crate::embed::{ChartEmbed, ChartEmbedder, ChartTheme, ContainerId, EmbedOptions, Interval};
use crate::error::DeskResult;
use crate::window::Ticker;

pub const WIDGET_MARKER: &str = "[TRADINGVIEW_WIDGET]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::System,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::User => "you",
            Role::Assistant => "desk",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mount {
    Empty,
    Mounted(ChartEmbed),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub container: ContainerId,
    /// Symbol from the answer payload; placeholders restored from history
    /// have none and stay inert.
    pub ticker: Option<Ticker>,
    pub mount: Mount,
}

impl Placeholder {
    pub fn is_empty(&self) -> bool {
        matches!(self.mount, Mount::Empty)
    }

    fn is_mountable(&self) -> bool {
        self.is_empty() && self.ticker.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Markdown(String),
    Widget(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub blocks: Vec<Block>,
}

impl ChatMessage {
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Widget(p) => Some(p),
            Block::Markdown(_) => None,
        })
    }
}

/// Split `text` on the marker, turning each occurrence into a placeholder.
fn split_blocks(text: &str, index: usize, ticker: Option<&Ticker>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut slot = 0;
    for (i, part) in text.split(WIDGET_MARKER).enumerate() {
        if i > 0 {
            blocks.push(Block::Widget(Placeholder {
                container: ContainerId::for_chat(index, slot),
                ticker: ticker.cloned(),
                mount: Mount::Empty,
            }));
            slot += 1;
        }
        if !part.trim().is_empty() {
            blocks.push(Block::Markdown(part.trim().to_string()));
        }
    }
    blocks
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn push_user(&mut self, text: &str) {
        self.messages.push(ChatMessage {
            role: Role::User,
            blocks: vec![Block::Markdown(text.to_string())],
        });
    }

    pub fn push_system(&mut self, text: &str) {
        self.messages.push(ChatMessage {
            role: Role::System,
            blocks: vec![Block::Markdown(text.to_string())],
        });
    }

    /// Append an answer and return its index.
    pub fn push_assistant(&mut self, text: &str, ticker: Option<Ticker>) -> usize {
        let index = self.messages.len();
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            blocks: split_blocks(text, index, ticker.as_ref()),
        });
        index
    }

    /// Replace the transcript with a stored session history.
    pub fn load_history<I>(&mut self, history: I)
    where
        I: IntoIterator<Item = (Role, String)>,
    {
        self.messages.clear();
        for (role, content) in history {
            match role {
                Role::Assistant => {
                    self.push_assistant(&content, None);
                }
                Role::User => self.push_user(&content),
                Role::System => self.push_system(&content),
            }
        }
    }

    pub fn placeholder_count(&self) -> usize {
        self.messages.iter().map(|m| m.placeholders().count()).sum()
    }

    fn next_mountable(&mut self) -> Option<&mut Placeholder> {
        self.messages
            .iter_mut()
            .flat_map(|m| m.blocks.iter_mut())
            .find_map(|b| match b {
                Block::Widget(p) if p.is_mountable() => Some(p),
                _ => None,
            })
    }
}

/// Mounts charts into empty chat placeholders.
#[derive(Debug, Default)]
pub struct ChatWidgetInjector {
    interval: Interval,
    theme: ChartTheme,
    mounted: usize,
}

impl ChatWidgetInjector {
    pub fn new(interval: Interval, theme: ChartTheme) -> Self {
        Self {
            interval,
            theme,
            mounted: 0,
        }
    }

    pub fn mounted(&self) -> usize {
        self.mounted
    }

    /// Mount a chart into the next empty placeholder. `Ok(None)` when there
    /// is nothing to fill. A failed embed marks the placeholder so it is not
    /// retried.
    pub fn inject<E: ChartEmbedder + ?Sized>(
        &mut self,
        transcript: &mut Transcript,
        embedder: &mut E,
    ) -> DeskResult<Option<ContainerId>> {
        let Some(slot) = transcript.next_mountable() else {
            return Ok(None);
        };
        let Some(ticker) = slot.ticker.clone() else {
            return Ok(None);
        };
        let options = EmbedOptions::new(ticker)
            .with_interval(self.interval)
            .with_theme(self.theme);
        match embedder.embed(&slot.container, &options) {
            Ok(embed) => {
                let container = slot.container.clone();
                slot.mount = Mount::Mounted(embed);
                self.mounted += 1;
                Ok(Some(container))
            }
            Err(error) => {
                slot.mount = Mount::Failed(error.to_string());
                Err(error)
            }
        }
    }

    /// Fill every empty placeholder currently in the transcript.
    pub fn inject_all<E: ChartEmbedder + ?Sized>(
        &mut self,
        transcript: &mut Transcript,
        embedder: &mut E,
    ) -> Vec<ContainerId> {
        let mut filled = Vec::new();
        loop {
            match self.inject(transcript, embedder) {
                Ok(Some(container)) => filled.push(container),
                Ok(None) => break,
                Err(error) => tracing::warn!(%error, "inline chart embed failed"),
            }
        }
        filled
    }
}
