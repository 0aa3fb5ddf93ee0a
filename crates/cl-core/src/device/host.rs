/// Host part of a `host[:port]` string.
pub fn bare_host(host: &str) -> &str {
    host.split_once(':').map_or(host, |(bare, _)| bare)
}

/// Two hosts are the same device when they match ignoring the port.
pub fn host_is_same(host1: &str, host2: &str) -> bool {
    bare_host(host1) == bare_host(host2)
}

pub fn host_with_port(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}
