fn main() {
    if let Err(e) = movie_finder::run() {
        eprintln!("movie-finder: {:#}", e);
        std::process::exit(1);
    }
}
