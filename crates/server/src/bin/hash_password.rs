use server::auth::password::hash_password;

fn main() {
    let Some(password) = std::env::args().nth(1) else {
        eprintln!("Usage: hash-password <password>");
        std::process::exit(2);
    };

    let hash = hash_password(&password).expect("Failed to hash password");
    println!("{hash}");
}
