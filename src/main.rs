#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    kony_admin_server::run().await
}
