use vedette::config::Config;
use vedette::http::request::Method;
use vedette::http::response::Response;
use vedette::http::status;
use vedette::server::HttpServer;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let cfg = Config::load();

    let mut server = HttpServer::new();
    server.register_handler(Method::GET, "/", |_request| {
        Response::build_with(status::OK, "vedette is up\n")
    });
    server.register_handler(Method::POST, "/echo", |request| {
        Response::build_with(status::OK, request.body().to_vec())
    });

    server.serve(&cfg.service, &cfg.host)
}
