// Errors of the command glue.  The core modules have their own typed errors
// which are linked in here.

error_chain::error_chain! {
    foreign_links {
        Config(crate::config::ConfigError);
        Contest(crate::contest::ContestError);
        Template(crate::template::TemplateError);
        Io(std::io::Error);
    }
}
