pub mod chat;
pub mod domain;
pub mod ports;
pub mod prompts;
pub mod sections;

pub use chat::{ChatRequest, ChatResponse, Choice, Message, Role, Usage};
pub use domain::{Actor, AlreadyRescued, AuthSession, NewRescuePet, RescuePet, User, UserCredentials};
pub use ports::{
    CompletionService, ImageHostService, PortError, PortResult, RescueStore, UserStore,
};
pub use prompts::{build_request, resolve_species, AssistTask, ModelCatalog, TaskKind};
pub use sections::{parse_care_suggestions, split_sections, ParsedSections};
