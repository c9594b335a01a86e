pub mod catalog;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub mod models {
    pub mod column;
    pub mod grid;
    pub mod session;
}

pub mod repositories {
    pub mod token_storage;
}

pub mod services {
    pub mod api_client;
    pub mod grid_adapter;
    pub mod grid_response;
    pub mod grid_view;
    pub mod registry;
    pub mod session;
}

pub mod handlers {
    pub mod auth;
    pub mod grids;
    pub mod response;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod auth;
    pub mod grid;
}
