use serde_json::json;
use worker::*;

pub fn handle(_req: Request, _ctx: RouteContext<()>) -> Result<Response> {
    Response::from_json(&json!({
        "service": "feedgram",
        "usage": "/feed?handle=<profile>&count=<n>",
    }))
}
