pub mod create;
pub mod lookup;
pub mod status;
pub mod trade_id;
pub mod view;

pub use create::CreateTradeForm;
pub use lookup::{IdStatus, ResolveForm, TradeLookup};
pub use status::TxStatus;
pub use trade_id::{fresh_trade_id, trade_id_from_seed};
pub use view::TradeView;
