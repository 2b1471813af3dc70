use rocket::launch;

#[launch]
fn rocket() -> _ {
    score_server::server()
}
