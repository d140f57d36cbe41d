//! HTTP lookup endpoint
//!
//! `GET /translate/{code}?locale=<tag>&args=a,b`
//! - `200` with the rendered message as text
//! - `404` when the code is unknown in that locale
//! - `400` when the locale is unparseable or not registered

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::watch;
use tracing::debug;
use tracing::info;
use warp::http::StatusCode;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::Error;
use crate::Locale;
use crate::Translator;

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateQuery {
    locale: String,
    #[serde(default)]
    args: Option<String>,
}

pub fn routes(translator: Arc<Translator>) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("translate" / String)
        .and(warp::get())
        .and(warp::query::<TranslateQuery>())
        .and(warp::any().map(move || translator.clone()))
        .and_then(translate_handler)
}

/// Serves the lookup endpoint until `shutdown_signal` fires.
pub async fn start_server(
    translator: Arc<Translator>,
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    info!(port, "translation endpoint listening");
    let (_, server) =
        warp::serve(routes(translator)).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    server.await;
}

pub(crate) async fn translate_handler(
    code: String,
    query: TranslateQuery,
    translator: Arc<Translator>,
) -> Result<impl Reply, Rejection> {
    let locale = match Locale::parse(&query.locale) {
        Ok(l) => l,
        Err(e) => return Ok(warp::reply::with_status(e.to_string(), StatusCode::BAD_REQUEST)),
    };
    let args: Vec<&str> = match query.args.as_deref() {
        Some(a) if !a.is_empty() => a.split(',').collect(),
        _ => Vec::new(),
    };

    let reply = match translator.message(&code, &args, &locale) {
        Ok(Some(rendered)) => warp::reply::with_status(rendered, StatusCode::OK),
        Ok(None) => {
            debug!(code, %locale, "no translation");
            warp::reply::with_status(format!("No translation for {code}"), StatusCode::NOT_FOUND)
        }
        Err(e @ Error::LocaleNotSupported(_)) => warp::reply::with_status(e.to_string(), StatusCode::BAD_REQUEST),
        Err(e) => warp::reply::with_status(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::seeded_store;
    use crate::test_utils::test_config;
    use crate::ReloadMode;
    use crate::TaskPools;

    async fn translator() -> Arc<Translator> {
        let mut config = test_config();
        config.reload.mode = ReloadMode::Sync;
        let translator = Arc::new(Translator::new(
            Arc::new(seeded_store()),
            &config,
            TaskPools::current(),
        ));
        translator.start().await.unwrap();
        translator
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_translate_renders_message() {
        let api = routes(translator().await);

        let res = warp::test::request()
            .method("GET")
            .path("/translate/greet.hello?locale=en-US&args=World")
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), "Hello World");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_translate_without_args_keeps_placeholders() {
        let api = routes(translator().await);

        let res = warp::test::request()
            .path("/translate/greet.hello?locale=bn")
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), "Nomoskar {0}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unknown_code_is_not_found() {
        let api = routes(translator().await);

        let res = warp::test::request()
            .path("/translate/missing?locale=en")
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_bad_locales_are_rejected() {
        let api = routes(translator().await);

        for path in [
            "/translate/greet.hello?locale=fr",
            "/translate/greet.hello?locale=!!",
            "/translate/greet.hello",
        ] {
            let res = warp::test::request().path(path).reply(&api).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "path {path}");
        }
    }
}
