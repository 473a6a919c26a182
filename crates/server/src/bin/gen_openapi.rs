use server::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let spec = ApiDoc::openapi()
        .to_pretty_json()
        .expect("Failed to serialize OpenAPI spec to JSON");

    // With an argument, write to that path; otherwise print to stdout.
    match std::env::args().nth(1) {
        Some(path) => {
            std::fs::write(&path, &spec).expect("Failed to write OpenAPI spec");
            eprintln!("Wrote OpenAPI spec to {path}");
        }
        None => println!("{spec}"),
    }
}
