pub mod codec;
pub mod handle;
pub mod request;
pub mod response;
pub mod settings;

pub use codec::{default_parse, default_to_json, CodecError};
pub use handle::{DispatchState, RequestHandle};
pub use request::{normalize, BeforeSend, Callback, RequestSettings, WireRequest};
pub use response::{BulkCallback, BulkReply, Outcome, StatusLabel, WireResponse};
pub use settings::{BatchOverrides, BatchSettings, DataType, ParseHook, SerializeHook, ToJsonHook};
