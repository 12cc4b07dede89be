pub mod admin;
pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;

use actix_web::web;

/// Mounts every API route. Expected to sit inside the `/api` scope wrapped by
/// `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::me)
            .service(auth::logout)
            .service(auth::forgot_password)
            .service(auth::reset_password)
            .service(auth::change_password),
    )
    .service(
        web::scope("/admin")
            .service(admin::list_users)
            .service(admin::update_role)
            .service(admin::delete_user)
            .service(admin::list_all_tasks)
            .service(admin::list_all_projects),
    )
    .service(
        web::scope("/projects")
            .service(projects::create_project)
            .service(projects::list_projects)
            .service(projects::add_member)
            .service(projects::remove_member),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_project_tasks)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task)
            .service(tasks::add_comment)
            .service(tasks::add_subtask)
            .service(tasks::update_subtask),
    );
}
