use std::process::Command;

use crate::config_file::CurlConfig;
use crate::process::{self, ProcessError};

/// Build a curl invocation; `extended` adds the `xcurl` flags.
#[must_use]
pub fn curl_command(config: &CurlConfig, extended: bool, args: &[String]) -> Command {
    let mut cmd = Command::new("curl");
    cmd.args(&config.args);
    if extended {
        cmd.args(&config.extended_args);
    }
    cmd.args(args);
    cmd
}

/// Run curl with the configured defaults.
///
/// # Errors
///
/// Returns `ProcessError` if curl cannot be started or fails.
pub fn curl(config: &CurlConfig, extended: bool, args: &[String]) -> Result<(), ProcessError> {
    process::run(&mut curl_command(config, extended, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_curl() {
        let cmd = curl_command(&CurlConfig::default(), false, &["http://localhost:8080/health".to_string()]);
        insta::assert_snapshot!(
            process::display(&cmd),
            @"curl --silent --show-error --location http://localhost:8080/health"
        );
    }

    #[test]
    fn test_extended_curl() {
        let cmd = curl_command(&CurlConfig::default(), true, &["-d".to_string(), "@a.xml".to_string()]);
        insta::assert_snapshot!(
            process::display(&cmd),
            @"curl --silent --show-error --location -H Accept: application/xml -H Content-Type: application/xml -d @a.xml"
        );
    }
}
