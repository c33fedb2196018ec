pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod resort;
pub mod tracking;

pub use catalog::{ItemMatch, Menu, MenuItem, CURRENCY};
pub use config::{
    AppConfig, ConfigError, ConfigOverrides, DatabaseConfig, LlmConfig, LlmProvider, LoadOptions,
    LogFormat, LoggingConfig, ServerConfig,
};
pub use domain::conversation::{ConversationId, ConversationTurn, NewConversationTurn, Sender};
pub use domain::department::Department;
pub use domain::order::{order_total, NewRestaurantOrder, OrderLine, RestaurantOrder};
pub use domain::record::{RecordId, RecordRef, ServiceRecord, ServiceStatus};
pub use domain::room::{seed_room_numbers, Room, RoomNumber, ROOM_SEED_RANGES};
pub use domain::room_service::{NewRoomServiceRequest, RequestType, RoomServiceRequest};
pub use domain::session::GuestSession;
pub use errors::DomainError;
pub use resort::{ReceptionTopic, ResortInfo};
pub use tracking::{candidate_display_id, DisplayId, DISPLAY_SUFFIX_LEN, MAX_GENERATION_ATTEMPTS};
