//! The synchronized entity model: pure data plus invariant-preserving
//! mutators, no protocol knowledge. The dispatcher is the only writer.

pub mod alias;
pub mod buffer;
pub mod buffer_collection;
pub mod bufferview;
pub mod highlight;
pub mod identity;
pub mod ignore;
pub mod message;
pub mod network;
pub mod pattern;
pub mod user;

pub use alias::{Alias, AliasManager};
pub use buffer::{BufferMember, IrcBuffer};
pub use buffer_collection::IrcBufferCollection;
pub use bufferview::BufferView;
pub use highlight::{HighlightNickType, HighlightRule, HighlightRuleManager};
pub use identity::Identity;
pub use ignore::{IgnoreItem, IgnoreList, IgnoreScope, IgnoreType, Strictness};
pub use message::{HighlightMode, IrcMessage};
pub use network::{Network, NetworkCollection, NetworkServer, QuitOutcome};
pub use user::IrcUser;
