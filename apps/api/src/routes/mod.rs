pub mod health;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::assessments::handlers as assessments;
use crate::dashboard;
use crate::db::snapshot::flush_after_mutation;
use crate::jobs::handlers as jobs;
use crate::network::simulate_network;
use crate::pipeline::{applications, candidates};
use crate::state::AppState;

/// Every API route. Requests pass the network simulation first, then the
/// snapshot flush, then the handler.
fn api_routes(state: AppState) -> Router {
    Router::new()
        // Jobs
        .route(
            "/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/jobs/companies", get(jobs::handle_list_companies))
        .route(
            "/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/jobs/:id/reorder", patch(jobs::handle_reorder_job))
        // Candidates (legacy view)
        .route(
            "/candidates",
            get(candidates::handle_list_candidates).post(candidates::handle_create_candidate),
        )
        .route(
            "/candidates/:id",
            get(candidates::handle_get_candidate).patch(candidates::handle_update_candidate),
        )
        .route(
            "/candidates/:id/timeline",
            get(candidates::handle_candidate_timeline),
        )
        // Applications
        .route(
            "/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_create_application),
        )
        .route(
            "/applications/job-counts",
            get(applications::handle_job_counts),
        )
        .route(
            "/applications/statistics",
            get(applications::handle_application_statistics),
        )
        .route(
            "/applications/:id",
            patch(applications::handle_update_application)
                .delete(applications::handle_delete_application),
        )
        .route(
            "/applications/:id/status",
            patch(applications::handle_update_status),
        )
        // Assessments
        .route("/assessments", get(assessments::handle_list_assessments))
        .route(
            "/assessments/:job_id",
            get(assessments::handle_get_assessment)
                .put(assessments::handle_put_assessment)
                .delete(assessments::handle_delete_assessment),
        )
        .route(
            "/assessments/:job_id/submit",
            post(assessments::handle_submit_assessment),
        )
        // Dashboard
        .route(
            "/dashboard/statistics",
            get(dashboard::handle_dashboard_statistics),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            flush_after_mutation,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            simulate_network,
        ))
        .with_state(state)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .merge(api_routes(state))
}
