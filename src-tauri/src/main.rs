// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    // Control log level with RUST_LOG env var:
    //   RUST_LOG=debug ./apkmeta
    //   RUST_LOG=apkmeta_lib::apk=trace ./apkmeta
    apkmeta_lib::logging::init();

    apkmeta_lib::run()
}
