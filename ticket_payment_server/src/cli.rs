use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Merchant keys are deliberately absent from this list
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "TPG_HOST",
        "TPG_PORT",
        "TPG_DATABASE_URL",
        "TPG_USE_X_FORWARDED_FOR",
        "TPG_USE_FORWARDED",
        "TPG_CALLBACK_IP_WHITELIST",
        "TPG_RETURN_URL",
        "TPG_PAYME_MERCHANT_ID",
        "TPG_PAYME_CHECKOUT_URL",
        "TPG_CLICK_SERVICE_ID",
        "TPG_CLICK_MERCHANT_ID",
        "TPG_CLICK_CHECKOUT_URL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
