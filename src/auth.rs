use anyhow::{bail, Result};
use std::io::{self, IsTerminal};
use zeroize::Zeroizing;

pub fn read_password(prompt: &str) -> Result<Zeroizing<String>> {
    //  Environment Variable
    //  EKSBLOWFISH_PASSWORD="supersecret" eksblowfish hash
    if let Ok(pw) = std::env::var("EKSBLOWFISH_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    //  stdin (Pipeline)
    //  printf "%s\n" "$SECRET" | eksblowfish verify '$2b$12$...'
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_line(&mut buf)?;
        trim_newline(&mut buf);

        if !buf.is_empty() {
            return Ok(buf);
        }
        bail!("No password provided");
    }

    //  Interactive (TTY)
    let pw = Zeroizing::new(rpassword::prompt_password(prompt)?);
    if pw.is_empty() {
        bail!("password cannot be empty");
    }
    Ok(pw)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
