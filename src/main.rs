fn main() {
    let code = space_launcher::run_cli();
    if code != 0 {
        std::process::exit(code);
    }
}
