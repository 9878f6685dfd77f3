pub mod IpifyModels;
