// The api module is the platform layer: the HTTP surface the Mini App
// talks to. Authentication, routing, DTOs and error mapping live here;
// business rules stay in core.

#[path = "auth/telegram_auth.rs"]
pub mod auth;

#[path = "http/rest.rs"]
pub mod rest;
