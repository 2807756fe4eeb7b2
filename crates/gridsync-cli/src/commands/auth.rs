//! Auth subcommand: Google Calendar login / logout / status.

use clap::Subcommand;

use gridsync_core::integrations::GoogleAuth;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Authenticate with Google Calendar
    Login {
        /// OAuth client ID from Google Cloud Console
        #[arg(long)]
        client_id: String,
        /// OAuth client secret
        #[arg(long)]
        client_secret: String,
    },
    /// Remove stored credentials
    Logout,
    /// Check authentication status
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Login {
            client_id,
            client_secret,
        } => {
            GoogleAuth::set_credentials(&client_id, &client_secret)?;
            GoogleAuth::from_keyring().login()?;
            println!("Google authenticated");
        }
        AuthAction::Logout => {
            GoogleAuth::logout()?;
            println!("Google credentials removed");
        }
        AuthAction::Status => {
            if GoogleAuth::is_authenticated() {
                println!("Google: authenticated");
            } else {
                println!("Google: not authenticated");
            }
        }
    }
    Ok(())
}
