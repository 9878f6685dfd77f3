pub mod AttendanceModels;
