use worker::*;

mod feed;
mod handlers;
mod utils;

#[event(fetch)]
async fn fetch(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    // Strip trailing slash (except root) and redirect-internally by rewriting
    let url = req.url()?;
    let path = url.path().to_string();

    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let mut new_url = url.clone();
        new_url.set_path(trimmed);
        let new_req = Request::new_with_init(
            new_url.as_str(),
            &RequestInit {
                method: req.method(),
                headers: req.headers().clone(),
                ..Default::default()
            },
        )?;
        let router = build_router();
        return router.run(new_req, env).await;
    }

    let router = build_router();
    router.run(req, env).await
}

fn build_router() -> Router<'static, ()> {
    Router::new()
        .get("/", handlers::home::handle)
        .get_async("/feed", |req, ctx| async move {
            handlers::feed::handle(req, ctx).await
        })
        .options("/feed", handlers::feed::preflight)
        .or_else_any_method("/feed", handlers::feed::method_not_allowed)
}
