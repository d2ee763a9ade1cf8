// crates/message-catalog-core/src/runtime/host.rs
// ============================================================================
// Module: Catalog Host Integration
// Description: Per-event injection of the current catalog into handler context.
// Purpose: Attach an actualized snapshot to every inbound event before dispatch.
// Dependencies: crate::{core, runtime::service}, serde
// ============================================================================

//! ## Overview
//! The host dispatcher builds an [`EventContext`] for each inbound event and
//! runs [`CatalogMiddleware::pre_process`] before invoking handlers. Handlers
//! then read message texts from [`EventContext::messages`]. Injection never
//! fails: store trouble is absorbed by [`CatalogService::actualize`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::core::CatalogSnapshot;
use crate::runtime::service::CatalogService;

// ============================================================================
// SECTION: Event Kinds
// ============================================================================

/// Inbound event kinds that receive the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// New chat message.
    Message,
    /// Edited chat message.
    EditedMessage,
    /// New channel post.
    ChannelPost,
    /// Edited channel post.
    EditedChannelPost,
    /// Inline query.
    InlineQuery,
    /// Chosen inline result.
    ChosenInlineResult,
    /// Callback query from an inline keyboard.
    CallbackQuery,
    /// Shipping query.
    ShippingQuery,
    /// Pre-checkout query.
    PreCheckoutQuery,
    /// Poll state update.
    Poll,
    /// Poll answer.
    PollAnswer,
}

impl EventKind {
    /// Every event kind, in dispatch table order.
    pub const ALL: [Self; 11] = [
        Self::Message,
        Self::EditedMessage,
        Self::ChannelPost,
        Self::EditedChannelPost,
        Self::InlineQuery,
        Self::ChosenInlineResult,
        Self::CallbackQuery,
        Self::ShippingQuery,
        Self::PreCheckoutQuery,
        Self::Poll,
        Self::PollAnswer,
    ];

    /// Returns the stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::EditedChannelPost => "edited_channel_post",
            Self::InlineQuery => "inline_query",
            Self::ChosenInlineResult => "chosen_inline_result",
            Self::CallbackQuery => "callback_query",
            Self::ShippingQuery => "shipping_query",
            Self::PreCheckoutQuery => "pre_checkout_query",
            Self::Poll => "poll",
            Self::PollAnswer => "poll_answer",
        }
    }
}

// ============================================================================
// SECTION: Context and Middleware
// ============================================================================

/// Handler-visible data for one inbound event.
#[derive(Debug, Clone)]
pub struct EventContext {
    /// Event kind being dispatched.
    pub kind: EventKind,
    /// Catalog attached by the middleware.
    pub messages: Option<Arc<CatalogSnapshot>>,
}

impl EventContext {
    /// Creates an empty context for `kind`.
    #[must_use]
    pub const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            messages: None,
        }
    }
}

/// Pre-dispatch hook attaching the actualized catalog.
#[derive(Clone)]
pub struct CatalogMiddleware {
    /// Shared catalog service.
    service: Arc<CatalogService>,
}

impl CatalogMiddleware {
    /// Wraps a shared catalog service.
    #[must_use]
    pub const fn new(service: Arc<CatalogService>) -> Self {
        Self {
            service,
        }
    }

    /// Attaches the current catalog to `context`, replacing any earlier value.
    pub fn pre_process(&self, context: &mut EventContext) {
        context.messages = Some(self.service.actualize());
    }
}
