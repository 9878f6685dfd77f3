pub mod IpifyServices;
