//! Command-line configuration.

use crate::error::ClientResult;
use crate::frame::RecordTags;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const USAGE_EXAMPLES: &str = "\
USAGE EXAMPLES:

  Apache (per virtual host):
    CustomLog \"| /usr/bin/tcpweblog-client 10.0.3.15 9940 /var/log/tcpweblog_cache.log access.log 1 10.0.2.15 xhost\" combined
    ErrorLog \"| /usr/bin/tcpweblog-client 10.0.3.15 9940 /var/log/tcpweblog_cache.log error.log 1 10.0.2.15 xhost\"

  Apache SSL (per virtual host):
    CustomLog \"| /usr/bin/tcpweblog-client 10.0.3.15 9940 /var/log/tcpweblog_cache.log ssl.access.log 1 10.0.2.15 xhost\" combined
    ErrorLog \"| /usr/bin/tcpweblog-client 10.0.3.15 9940 /var/log/tcpweblog_cache.log ssl.error.log 1 10.0.2.15 xhost\"

  Apache (general CustomLog):
    The log format must start with \"%h %V\", for example:
    LogFormat \"%h %V %{X-Forwarded-For}i %l %u %t \\\"%r\\\" %>s %b \\\"%{Referer}i\\\" \\\"%{User-Agent}i\\\"\" common
    CustomLog \"| /usr/bin/tcpweblog-client 10.0.3.15 9940 /var/log/tcpweblog_cache.log access.log 1 - -\" common

  varnishncsa:
    The log format must start with \"%h %V\", for example:
    varnishncsa -F \"%h %V %{X-Forwarded-For}i %l %u %t \\\"%r\\\" %>s %b \\\"%{Referer}i\\\" \\\"%{User-Agent}i\\\"\" | /usr/bin/tcpweblog-client 10.0.3.15 9940 /var/log/tcpweblog_cache.log varnish.log 1 - -

NOTES:
  Input lines longer than 65536 bytes are truncated.
  With SELinux, allow Apache to open network connections:
    setsebool -P httpd_can_network_connect=1";

/// TCPWebLog client: forwards piped log lines to a remote TCPWebLog server.
#[derive(Parser, Debug)]
#[command(name = "tcpweblog-client", version)]
#[command(about = "Forwards piped log lines to a remote TCPWebLog server, caching them while it is unreachable")]
#[command(after_long_help = USAGE_EXAMPLES)]
pub struct Args {
    /// IP address of the remote log server (IPv6, or IPv4).
    pub remote_ip_address: IpAddr,

    /// TCP port of the remote log server.
    pub remote_port: u16,

    /// Local file used to cache records while the server is unreachable.
    pub local_cache_file: PathBuf,

    /// Log name attached to every record, e.g. access.log.
    pub logname: String,

    /// Cluster number attached to every record.
    #[arg(allow_negative_numbers = true)]
    pub cluster_number: i64,

    /// Client IP address, or "-" when the log line already carries it.
    pub client_ip: String,

    /// Client hostname, or "-" when the log line already carries it.
    pub client_hostname: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TCPWEBLOG_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Also write diagnostics as JSON lines to this file.
    #[arg(long, env = "TCPWEBLOG_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Validate the arguments and build the client configuration.
    pub fn into_config(self) -> ClientResult<ClientConfig> {
        let tags = RecordTags {
            stream_name: self.logname,
            cluster_id: self.cluster_number,
            client_ip: self.client_ip,
            client_host: self.client_hostname,
        };
        tags.validate()?;

        Ok(ClientConfig {
            remote: SocketAddr::new(self.remote_ip_address, self.remote_port),
            cache_path: self.local_cache_file,
            tags,
            log_level: self.log_level,
            log_file: self.log_file,
        })
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the remote log server.
    pub remote: SocketAddr,
    /// Path of the overflow file.
    pub cache_path: PathBuf,
    /// Routing metadata for every record.
    pub tags: RecordTags,
    /// Default log level.
    pub log_level: String,
    /// Optional JSONL diagnostics file.
    pub log_file: Option<PathBuf>,
}
