//! Fixed routing policy written into every generated configuration.
//!
//! Every entry point that rewrites a configuration goes through these
//! constants, so identical input always yields identical output.

use serde_yaml::{Mapping, Value};

/// Bumped whenever [`RULES_V1`] or [`dns_block`] change.
pub const POLICY_VERSION: u32 = 1;

/// Entries whose name contains this marker are stripped from proxy lists.
pub const URL_TEST_MARKER: &str = "Auto - UrlTest";

/// Top-level keys for features the containerised daemon does not support.
pub const UNSUPPORTED_KEYS: &[&str] = &["script", "rule-providers"];

/// Routing rules, evaluated top to bottom by the daemon.
pub const RULES_V1: &[&str] = &[
    "DOMAIN-SUFFIX,google.com,Proxy",
    "DOMAIN-SUFFIX,facebook.com,Proxy",
    "DOMAIN-SUFFIX,youtube.com,Proxy",
    "DOMAIN-SUFFIX,twitter.com,Proxy",
    "DOMAIN-SUFFIX,instagram.com,Proxy",
    "DOMAIN-SUFFIX,github.com,Proxy",
    "DOMAIN-SUFFIX,githubusercontent.com,Proxy",
    "DOMAIN-SUFFIX,netflix.com,Proxy",
    "DOMAIN-SUFFIX,spotify.com,Proxy",
    "DOMAIN-SUFFIX,telegram.org,Proxy",
    "DOMAIN-SUFFIX,whatsapp.com,Proxy",
    "DOMAIN-SUFFIX,amazon.com,Proxy",
    "DOMAIN-SUFFIX,cloudflare.com,Proxy",
    "DOMAIN-SUFFIX,baidu.com,DIRECT",
    "DOMAIN-SUFFIX,qq.com,DIRECT",
    "DOMAIN-SUFFIX,taobao.com,DIRECT",
    "DOMAIN-SUFFIX,jd.com,DIRECT",
    "DOMAIN-SUFFIX,163.com,DIRECT",
    "DOMAIN-SUFFIX,126.com,DIRECT",
    "DOMAIN-SUFFIX,sina.com.cn,DIRECT",
    "DOMAIN-SUFFIX,weibo.com,DIRECT",
    "DOMAIN-SUFFIX,alipay.com,DIRECT",
    "DOMAIN-SUFFIX,wechat.com,DIRECT",
    "DOMAIN-SUFFIX,tencent.com,DIRECT",
    "DOMAIN-SUFFIX,alibaba.com,DIRECT",
    "DOMAIN-SUFFIX,aliyun.com,DIRECT",
    "DOMAIN-SUFFIX,weixin.qq.com,DIRECT",
    "DOMAIN-SUFFIX,tmall.com,DIRECT",
    "GEOIP,CN,DIRECT",
    "MATCH,Proxy",
];

const DEFAULT_NAMESERVERS: &[&str] = &["223.5.5.5", "119.29.29.29"];
const DOH_SERVERS: &[&str] = &[
    "https://doh.pub/dns-query",
    "https://dns.alidns.com/dns-query",
];
const FALLBACK_IPCIDR: &[&str] = &["240.0.0.0/4", "0.0.0.0/32"];

fn string_list(items: &[&str]) -> Value {
    Value::Sequence(items.iter().map(|item| Value::from(*item)).collect())
}

/// The rule table as a YAML sequence.
pub fn rules() -> Value {
    string_list(RULES_V1)
}

/// The `dns` block: plain resolvers for bootstrap, DoH for everything else.
pub fn dns_block() -> Value {
    let mut filter = Mapping::new();
    filter.insert("geoip".into(), true.into());
    filter.insert("ipcidr".into(), string_list(FALLBACK_IPCIDR));

    let mut dns = Mapping::new();
    dns.insert("enable".into(), true.into());
    dns.insert("listen".into(), "0.0.0.0:53".into());
    dns.insert("default-nameserver".into(), string_list(DEFAULT_NAMESERVERS));
    dns.insert("nameserver".into(), string_list(DOH_SERVERS));
    dns.insert("fallback".into(), string_list(DOH_SERVERS));
    dns.insert("fallback-filter".into(), Value::Mapping(filter));
    Value::Mapping(dns)
}
