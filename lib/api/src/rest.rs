use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use knnrec_core::{
    Axis, Error, LabeledReport, Neighbor, PredictionMode, Recommender, RecommenderConfig,
    SimilarityMetric,
};
use knnrec_storage::Dataset;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Deserialize)]
struct PredictQuery {
    user: u32,
    item: u32,
    k: Option<usize>,
    mode: Option<String>,
    metric: Option<String>,
}

#[derive(Deserialize)]
struct NeighborsQuery {
    k: Option<usize>,
    metric: Option<String>,
}

#[derive(Serialize)]
struct NeighborsResponse<'a> {
    axis: Axis,
    id: u32,
    k: usize,
    metric: SimilarityMetric,
    neighbors: &'a [Neighbor],
}

pub struct RestApi;

impl RestApi {
    pub async fn start(dataset: Arc<Dataset>, port: u16) -> std::io::Result<()> {
        info!("Starting REST API on port {}", port);

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(dataset.clone()))
                .configure(Self::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Register every route; shared by the server and the tests
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/health", web::get().to(health))
            .route("/stats", web::get().to(stats))
            .route("/predict", web::get().to(predict))
            .route("/items/{id}", web::get().to(get_item))
            .route("/users/{id}/neighbors", web::get().to(user_neighbors))
            .route("/items/{id}/neighbors", web::get().to(item_neighbors));
    }
}

fn error_response(error: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": error.to_string() });
    match error {
        Error::InsufficientData { .. } => HttpResponse::UnprocessableEntity().json(body),
        Error::InvalidConfig(_) | Error::InvalidRating { .. } => {
            HttpResponse::BadRequest().json(body)
        }
    }
}

/// Parse an optional query parameter, falling back to the type's default
fn parse_or_default<T>(value: Option<&str>) -> Result<T, Error>
where
    T: FromStr<Err = Error> + Default,
{
    value.map(T::from_str).transpose().map(Option::unwrap_or_default)
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

async fn stats(dataset: web::Data<Arc<Dataset>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(dataset.stats()))
}

async fn get_item(
    dataset: web::Data<Arc<Dataset>>,
    path: web::Path<u32>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match dataset.catalog().get(id) {
        Some(entry) => Ok(HttpResponse::Ok().json(entry)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Item {} not found", id)
        }))),
    }
}

async fn predict(
    dataset: web::Data<Arc<Dataset>>,
    query: web::Query<PredictQuery>,
) -> ActixResult<HttpResponse> {
    let query = query.into_inner();
    let config = match build_config(query.k, query.mode.as_deref(), query.metric.as_deref()) {
        Ok(config) => config,
        Err(e) => return Ok(error_response(&e)),
    };
    debug!(
        "predict user={} item={} k={} mode={:?}",
        query.user, query.item, config.k, config.mode
    );

    let reports = match Recommender::new(dataset.matrix(), config)
        .and_then(|recommender| recommender.recommend(query.user, query.item))
    {
        Ok(reports) => reports,
        Err(e) => return Ok(error_response(&e)),
    };

    let item_label = dataset.item_label(query.item);
    let body: Vec<LabeledReport<'_>> = reports
        .iter()
        .map(|report| LabeledReport::new(report, &item_label))
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

fn build_config(
    k: Option<usize>,
    mode: Option<&str>,
    metric: Option<&str>,
) -> Result<RecommenderConfig, Error> {
    let defaults = RecommenderConfig::default();
    let config = RecommenderConfig {
        k: k.unwrap_or(defaults.k),
        mode: parse_or_default::<PredictionMode>(mode)?,
        metric: parse_or_default::<SimilarityMetric>(metric)?,
    };
    config.validate()?;
    Ok(config)
}

async fn user_neighbors(
    dataset: web::Data<Arc<Dataset>>,
    path: web::Path<u32>,
    query: web::Query<NeighborsQuery>,
) -> ActixResult<HttpResponse> {
    neighbors(&dataset, Axis::User, path.into_inner(), &query)
}

async fn item_neighbors(
    dataset: web::Data<Arc<Dataset>>,
    path: web::Path<u32>,
    query: web::Query<NeighborsQuery>,
) -> ActixResult<HttpResponse> {
    neighbors(&dataset, Axis::Item, path.into_inner(), &query)
}

fn neighbors(
    dataset: &Dataset,
    axis: Axis,
    id: u32,
    query: &NeighborsQuery,
) -> ActixResult<HttpResponse> {
    let config = match build_config(query.k, None, query.metric.as_deref()) {
        Ok(config) => config,
        Err(e) => return Ok(error_response(&e)),
    };

    let neighborhood = match Recommender::new(dataset.matrix(), config)
        .and_then(|recommender| recommender.neighbors(axis, id))
    {
        Ok(neighborhood) => neighborhood,
        Err(e) => return Ok(error_response(&e)),
    };

    Ok(HttpResponse::Ok().json(NeighborsResponse {
        axis,
        id,
        k: config.k,
        metric: config.metric,
        neighbors: neighborhood.as_slice(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use knnrec_core::RatingMatrix;
    use knnrec_storage::{CatalogEntry, ItemCatalog};
    use serde_json::Value;

    fn dataset() -> Arc<Dataset> {
        let matrix = RatingMatrix::from_triples(vec![
            (1, 1, 5.0), (1, 2, 3.0), (1, 3, 4.0),
            (2, 1, 3.0), (2, 2, 1.0), (2, 3, 2.0), (2, 4, 3.0),
            (3, 1, 4.0), (3, 2, 3.0), (3, 3, 4.0), (3, 4, 3.0),
            (4, 1, 3.0), (4, 2, 3.0), (4, 3, 1.0), (4, 4, 5.0),
        ])
        .unwrap();
        let mut catalog = ItemCatalog::new();
        catalog.insert(CatalogEntry {
            id: 4,
            title: "Get Shorty".to_string(),
            release_year: Some(1995),
        });
        Arc::new(Dataset::new(matrix, catalog))
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(dataset()))
                    .configure(RestApi::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health_and_stats() {
        let app = app!();

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get().uri("/stats").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["users"], 4);
        assert_eq!(body["items"], 4);
        assert_eq!(body["ratings"], 15);
    }

    #[actix_web::test]
    async fn test_get_item() {
        let app = app!();

        let req = test::TestRequest::get().uri("/items/4").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["title"], "Get Shorty");
        assert_eq!(body["release_year"], 1995);

        let req = test::TestRequest::get().uri("/items/99").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_predict_both_pipelines() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/predict?user=1&item=4&k=2")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let reports = body.as_array().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0]["mode"], "user");
        assert_eq!(reports[1]["mode"], "item");
        for report in reports {
            assert_eq!(report["target_user"], 1);
            assert_eq!(report["target_item"], 4);
            assert_eq!(report["item_label"], "Get Shorty");
            assert_eq!(report["neighbor_ids"].as_array().unwrap().len(), 2);
            let predicted = report["predicted_rating"].as_f64().unwrap();
            assert!((0.0..=5.0).contains(&predicted));
        }
    }

    #[actix_web::test]
    async fn test_predict_single_mode_and_metric() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/predict?user=1&item=4&k=2&mode=item&metric=cosine")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let reports = body.as_array().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0]["mode"], "item");
    }

    #[actix_web::test]
    async fn test_predict_rejects_bad_parameters() {
        let app = app!();

        for uri in [
            "/predict?user=1&item=4&k=0",
            "/predict?user=1&item=4&mode=sideways",
            "/predict?user=1&item=4&metric=jaccard",
        ] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body: Value = test::read_body_json(resp).await;
            assert!(body["error"].is_string());
        }
    }

    #[actix_web::test]
    async fn test_neighbors_endpoints() {
        let app = app!();

        let req = test::TestRequest::get().uri("/users/1/neighbors?k=2").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["axis"], "user");
        assert_eq!(body["id"], 1);
        let neighbors = body["neighbors"].as_array().unwrap();
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|n| n["id"] != 1));

        let req = test::TestRequest::get().uri("/items/2/neighbors").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["axis"], "item");
        // default K of 5 capped by the three other items
        assert_eq!(body["neighbors"].as_array().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn test_insufficient_data_is_unprocessable() {
        let matrix = RatingMatrix::from_triples(vec![(1, 1, 4.0)]).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::new(Dataset::new(matrix, ItemCatalog::new()))))
                .configure(RestApi::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/users/1/neighbors").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
