//! # embed-core
//!
//! Reference, payload and status lifecycle for the posfra payment embed.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         ElementScanner                          │
//! │  ┌───────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │ ConfigBuilder │──│  RefLedger  │──│    PayloadEncoder    │  │
//! │  └───────────────┘  └─────────────┘  └──────────────────────┘  │
//! │            │                                   │               │
//! │            ▼                                   ▼               │
//! │  ┌──────────────────┐   load   ┌────────────────────────────┐  │
//! │  │  StatusPoller    │─────────▶│ Widget (guard + lifecycle) │  │
//! │  │  (StatusClient)  │ outcome  └────────────────────────────┘  │
//! │  └──────────────────┘                                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The browser (cookies, DOM, `beforeunload`, timers, fetch) sits behind the
//! [`CookieStore`], [`MarkerElement`], [`PageHost`], [`Timer`] and
//! [`StatusClient`] traits, so the whole lifecycle also runs natively.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use embed_core::{ElementScanner, ProductVariant, StatusPoller, WidgetHost, WidgetRegistry};
//!
//! let scanner = ElementScanner::new(host, Rc::new(WidgetRegistry::new()));
//! let report = scanner.scan(ProductVariant::PaymentRequest, &markers);
//!
//! for widget in report.mounted {
//!     let poller = StatusPoller::new(widget, client.clone(), timer.clone(), settings.poll_interval);
//!     spawn_local(async move { poller.run().await; });
//! }
//! ```

pub mod config;
pub mod cookie;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod mount;
pub mod payload;
pub mod poller;
pub mod reference;
pub mod registry;
pub mod scanner;
pub mod settings;
pub mod status;
pub mod testing;
pub mod timer;
pub mod widget;

pub use config::{AttributeSource, ConfigBuilder, PaymentOption, ProductVariant, WidgetConfig};
pub use cookie::{CookieSpec, CookieStore, MemoryCookieStore};
pub use error::{ConfigError, EmbedError, Result};
pub use guard::{GuardState, NavigationGuard, PageHost, UnloadPrompt};
pub use ledger::{EnsuredReference, RefLedger};
pub use mount::{IframeSpec, LoadCallback, MarkerElement};
pub use payload::{EncodedPayload, PayloadEncoder};
pub use poller::{PollOutcome, StatusPoller};
pub use reference::TransactionReference;
pub use registry::WidgetRegistry;
pub use scanner::{ElementScanner, ScanFailure, ScanReport};
pub use settings::EmbedSettings;
pub use status::{HttpStatusClient, StatusClient};
#[cfg(not(target_arch = "wasm32"))]
pub use timer::TokioTimer;
pub use timer::Timer;
pub use widget::{InstanceId, Transition, Widget, WidgetHost, WidgetPhase};
