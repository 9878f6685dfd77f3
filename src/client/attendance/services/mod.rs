pub mod AttendanceServices;
