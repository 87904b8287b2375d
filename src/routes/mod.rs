pub mod admin_auth;
pub mod admins;
pub mod departments;
pub mod employee_auth;
pub mod employees;

use axum::Router;
use axum::routing::{get, patch, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    let employee_auth = Router::new()
        .route("/signup", post(employee_auth::signup))
        .route("/login", post(employee_auth::login))
        .route("/logout", post(employee_auth::logout))
        .route("/forgot-password", post(employee_auth::forgot_password))
        .route(
            "/reset-password/{code}",
            patch(employee_auth::reset_password),
        );

    let admin_auth = Router::new()
        .route("/signup", post(admin_auth::signup))
        .route("/login", post(admin_auth::login))
        .route("/logout", post(admin_auth::logout))
        .route("/forgot-password", post(admin_auth::forgot_password))
        .route("/reset-password/{code}", patch(admin_auth::reset_password));

    let employees = Router::new()
        .route("/", get(employees::list).post(employees::create))
        .route("/me", get(employees::me))
        .route("/export-csv", get(employees::export_csv))
        .route("/export-excel", get(employees::export_excel))
        .route("/export-pdf", get(employees::export_pdf))
        .route("/import", post(employees::import))
        .route(
            "/{id}",
            get(employees::get_one)
                .put(employees::update)
                .delete(employees::delete),
        );

    let departments = Router::new()
        .route("/", get(departments::list).post(departments::create))
        .route(
            "/{id}",
            get(departments::get_one)
                .put(departments::update)
                .delete(departments::delete),
        );

    let admins = Router::new()
        .route("/", get(admins::list).post(admins::create))
        .route("/me", get(admins::me))
        .route(
            "/{id}",
            get(admins::get_one)
                .put(admins::update)
                .delete(admins::delete),
        );

    Router::new()
        .nest("/api/v1/employee-auth", employee_auth)
        .nest("/api/v1/admin-auth", admin_auth)
        .nest("/api/v1/employees", employees)
        .nest("/api/v1/departments", departments)
        .nest("/api/v1/admins", admins)
}
