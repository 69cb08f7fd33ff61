pub mod notification;
pub mod preferences;
pub mod suggestion;
pub mod task;
pub mod user;

pub use notification::{Notification, NotificationQuery, NotificationType};
pub use preferences::{UpdatePreferencesInput, UserPreferences};
pub use suggestion::{AiSuggestion, ResolveSuggestionRequest, SuggestionRequest};
pub use task::{
    CreateTaskInput, Pagination, SortBy, SortOrder, Task, TaskFilters, TaskPage, TaskPriority,
    TaskStats, TaskStatus, UpdateTaskInput,
};
pub use user::{PublicUser, User};
