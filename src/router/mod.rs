// Router module
// Maps method + path onto the fixed set of endpoints

use crate::upload::OperationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Upload(OperationKind),
    Health,
    Metrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    Found(Route),
    /// Known path, wrong method; carries the `Allow` value
    MethodNotAllowed(&'static str),
    NotFound,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Router;

impl Router {
    pub fn new() -> Self {
        Router
    }

    /// Resolve a request. Query strings are ignored; paths match exactly.
    pub fn route(&self, method: &str, path: &str) -> RouteMatch {
        let path = path.split('?').next().unwrap_or(path);

        let (route, allowed) = match path {
            "/resize_image" => (Route::Upload(OperationKind::Resize), "POST"),
            "/crop_image" => (Route::Upload(OperationKind::Crop), "POST"),
            "/adjust_contrast" => (Route::Upload(OperationKind::Contrast), "POST"),
            "/health" => (Route::Health, "GET"),
            "/metrics" => (Route::Metrics, "GET"),
            _ => return RouteMatch::NotFound,
        };

        if method == allowed {
            RouteMatch::Found(route)
        } else {
            RouteMatch::MethodNotAllowed(allowed)
        }
    }
}
