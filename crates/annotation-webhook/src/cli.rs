use clap::builder::PossibleValue;
use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("ANNOTATION_WEBHOOK_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("ANNOTATION_WEBHOOK_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("ANNOTATION_WEBHOOK_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("ANNOTATION_WEBHOOK_PORT")
            .help("Listen on PORT"),
        Arg::new("tls-cert")
            .long("tls-cert")
            .value_name("CERT_FILE")
            .default_value("/etc/certs/tls.crt")
            .env("ANNOTATION_WEBHOOK_TLS_CERT")
            .help("Path to an X.509 certificate file for HTTPS. Set to an empty string, together with --tls-key, to serve plain HTTP"),
        Arg::new("tls-key")
            .long("tls-key")
            .value_name("KEY_FILE")
            .default_value("/etc/certs/tls.key")
            .env("ANNOTATION_WEBHOOK_TLS_KEY")
            .help("Path to an X.509 private key file for HTTPS. Set to an empty string, together with --tls-cert, to serve plain HTTP"),
        Arg::new("namespace")
            .long("namespace")
            .value_name("NAMESPACE")
            .default_value("default")
            .env("ANNOTATION_WEBHOOK_NAMESPACE")
            .help("Annotate only the Pods created inside of this namespace"),
        Arg::new("annotation-key")
            .long("annotation-key")
            .value_name("KEY")
            .default_value("my-annotation")
            .env("ANNOTATION_WEBHOOK_ANNOTATION_KEY")
            .help("Key of the annotation added to the Pods"),
        Arg::new("annotation-value")
            .long("annotation-value")
            .value_name("VALUE")
            .default_value("added-by-webhook")
            .env("ANNOTATION_WEBHOOK_ANNOTATION_VALUE")
            .help("Value of the annotation added to the Pods"),
        Arg::new("patch-strategy")
            .long("patch-strategy")
            .value_name("STRATEGY")
            .default_value("map")
            .env("ANNOTATION_WEBHOOK_PATCH_STRATEGY")
            .value_parser([
                PossibleValue::new("map").help("Rewrite the whole annotations map"),
                PossibleValue::new("key").help("Write only the changed annotation keys"),
            ])
            .help("How annotation changes are expressed inside of the JSON patch"),
        Arg::new("policy-config")
            .long("policy-config")
            .value_name("POLICY_CONFIG_FILE")
            .env("ANNOTATION_WEBHOOK_POLICY_CONFIG")
            .help("YAML file holding the policy settings. Its values take precedence over the command line flags"),
        Arg::new("max-body-size")
            .long("max-body-size")
            .value_name("BYTES")
            .default_value("3145728")
            .env("ANNOTATION_WEBHOOK_MAX_BODY_SIZE")
            .help("Reject admission reviews bigger than BYTES"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
