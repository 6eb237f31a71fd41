//! Bundled sample snippets for driving the analysis loop without a
//! generator agent (see `POST /api/seed`).

use crate::task::Task;

/// Python snippet with SQL injection and path traversal patterns.
pub const EXAMPLE_PYTHON_CODE: &str = r#"
import os

def get_user_data(user_id):
    # Simulate fetching data - Potential for insecurity if user_id is injectable
    query = "SELECT * FROM users WHERE id = '" + user_id + "'"
    print(f"Executing query: {query}")
    # In a real app, database connection and execution would happen here
    # db.execute(query)
    return {"id": user_id, "name": "Sample User"}

def process_file(filename):
    # Potential path traversal if filename is user-controlled
    full_path = "/data/files/" + filename
    if os.path.exists(full_path):
        with open(full_path, 'r') as f:
            return f.read()
    return None
"#;

/// Java snippet with a string-concatenated SQL query.
pub const EXAMPLE_JAVA_CODE: &str = r#"
import java.sql.Connection;
import java.sql.DriverManager;
import java.sql.ResultSet;
import java.sql.Statement;

public class UserDAO {
    public String getUserInfo(String userId) {
        String userInfo = "";
        try {
            Connection conn = DriverManager.getConnection("jdbc:mysql://localhost:3306/mydb", "user", "password");
            Statement stmt = conn.createStatement();
            // Vulnerable to SQL Injection
            String query = "SELECT name, email FROM user_accounts WHERE user_id = '" + userId + "'";
            System.out.println("Executing: " + query);
            ResultSet rs = stmt.executeQuery(query);
            if (rs.next()) {
                userInfo = "Name: " + rs.getString("name") + ", Email: " + rs.getString("email");
            }
            conn.close();
        } catch (Exception e) {
            e.printStackTrace();
        }
        return userInfo;
    }
}
"#;

/// Build the bundled sample tasks as fresh User submissions.
pub fn sample_tasks() -> Vec<Task> {
    vec![
        Task::new(
            "Analyze Python code snippets for common vulnerabilities like SQL injection, \
             path traversal, and insecure deserialization.",
            EXAMPLE_PYTHON_CODE,
            Some("python".to_string()),
            "User",
        ),
        Task::new(
            "Analyze Java code for SQL injection vulnerabilities and suggest refactored \
             code to mitigate them using PreparedStatement.",
            EXAMPLE_JAVA_CODE,
            Some("java".to_string()),
            "User",
        ),
    ]
}
