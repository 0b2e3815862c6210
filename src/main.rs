//! Thin binary entry point: parse argv, dispatch, exit with the
//! resulting status code. All real logic lives in `casm::cli`.

fn main() {
    std::process::exit(casm::cli::run());
}
