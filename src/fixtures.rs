#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use crate::error::ConfError;
    use crate::shape::{Bindable, Shape};
    use crate::store::Properties;
    use crate::value::Value;

    /// Build a store from literal `(key, value)` pairs.
    pub fn props(pairs: &[(&str, &str)]) -> Properties {
        let mut p = Properties::new();
        for (k, v) in pairs {
            p.set(k, v, 0).unwrap();
        }
        p
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Server {
        pub host: String,
        pub port: u16,
        pub tags: Vec<String>,
        pub limits: BTreeMap<String, u32>,
        pub tls: Tls,
        pub common: Common,
        pub max_conns: u32,
    }

    impl Bindable for Server {
        fn shape() -> Shape {
            Shape::record::<Self>()
                .field::<String>("host", "${host:=localhost}")
                .field::<u16>("port", "${port:=8080}")
                .validate("$>0")
                .field::<Vec<String>>("tags", "${tags:=}")
                .field::<BTreeMap<String, u32>>("limits", "${limits:=}")
                .field::<Tls>("tls", "${tls}")
                .embed::<Common>("common")
                .implicit::<u32>("max_conns")
                .build()
        }

        fn from_value(value: Value) -> Result<Self, ConfError> {
            let mut r = value.into_record::<Self>()?;
            Ok(Self {
                host: r.take("host")?,
                port: r.take("port")?,
                tags: r.take("tags")?,
                limits: r.take("limits")?,
                tls: r.take("tls")?,
                common: r.take("common")?,
                max_conns: r.take("max_conns")?,
            })
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Tls {
        pub cert: String,
        pub verify: bool,
    }

    impl Bindable for Tls {
        fn shape() -> Shape {
            Shape::record::<Self>()
                .field::<String>("cert", "${cert}")
                .field::<bool>("verify", "${verify:=true}")
                .build()
        }

        fn from_value(value: Value) -> Result<Self, ConfError> {
            let mut r = value.into_record::<Self>()?;
            Ok(Self {
                cert: r.take("cert")?,
                verify: r.take("verify")?,
            })
        }
    }

    /// Embedded into [`Server`]: its fields sit directly under the server key.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Common {
        pub name: String,
        pub timeout: Duration,
    }

    impl Bindable for Common {
        fn shape() -> Shape {
            Shape::record::<Self>()
                .field::<String>("name", "${name}")
                .field::<Duration>("timeout", "${timeout:=30s}")
                .build()
        }

        fn from_value(value: Value) -> Result<Self, ConfError> {
            let mut r = value.into_record::<Self>()?;
            Ok(Self {
                name: r.take("name")?,
                timeout: r.take("timeout")?,
            })
        }
    }

    /// A single port that must be greater than 9.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Endpoint {
        pub port: u16,
    }

    impl Bindable for Endpoint {
        fn shape() -> Shape {
            Shape::record::<Self>()
                .field::<u16>("port", "${port}")
                .validate("$>9")
                .build()
        }

        fn from_value(value: Value) -> Result<Self, ConfError> {
            let mut r = value.into_record::<Self>()?;
            Ok(Self {
                port: r.take("port")?,
            })
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Pool {
        pub size: u32,
        pub hosts: Vec<String>,
    }

    impl Bindable for Pool {
        fn shape() -> Shape {
            Shape::record::<Self>()
                .field::<u32>("size", "${size:=4}")
                .field::<Vec<String>>("hosts", "${hosts:=}")
                .build()
        }

        fn from_value(value: Value) -> Result<Self, ConfError> {
            let mut r = value.into_record::<Self>()?;
            Ok(Self {
                size: r.take("size")?,
                hosts: r.take("hosts")?,
            })
        }
    }

    #[test]
    fn fixtures_bind_from_defaults() {
        let pool = Properties::new().bind::<Pool>("${pool}").unwrap();
        assert_eq!(pool.size, 4);
        assert!(pool.hosts.is_empty());
    }
}
